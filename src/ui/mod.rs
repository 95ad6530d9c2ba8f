//! Text rendering of the dashboard.
//!
//! ```text
//! AppState → compute_viewmodel → DashboardViewModel → render → text
//! ```
//!
//! # Modules
//!
//! - [`viewmodel`]: Display-ready dashboard types
//! - [`renderer`]: Writes the dashboard as plain text
//! - [`helpers`]: Date, currency and column formatting

pub mod helpers;
pub mod renderer;
pub mod viewmodel;

pub use renderer::render;
pub use viewmodel::{
    DashboardViewModel, EmptyState, FillupLine, HeaderInfo, QuickStats, VehicleCard,
};
