//! Structured logging to a rotating file.
//!
//! ```text
//! tracing macros → EnvFilter → fmt layer → FileWriter → <data dir>/miley.log
//! ```
//!
//! The log level is controlled by `RUST_LOG` first, then `log_level` in the
//! configuration, then defaults to `info`.
//!
//! # Modules
//!
//! - [`init`]: Subscriber setup
//! - [`file_writer`]: Size-rotating log file

mod file_writer;
mod init;

pub use file_writer::FileWriter;
pub use init::{init_tracing, LOG_FILE_NAME};
