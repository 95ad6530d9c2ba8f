//! Spreadsheet export of the fillup log.
//!
//! - [`csv`]: Comma-separated rendering and the downloadable artifact

pub mod csv;

pub use self::csv::{export_fillups, Download};
