//! Application layer coordinating state, events, and actions.
//!
//! ```text
//! Front end → Event → handle_event → AppState command → RemoteStore
//!                          ↓
//!                       Actions → Front end (alerts, confirmations, downloads)
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effects requested from the front end
//! - [`handler`]: Maps user intents onto state commands
//! - [`modes`]: Dialog state
//! - [`state`]: In-memory mirror and its store-backed commands

pub mod actions;
pub mod handler;
pub mod modes;
pub mod state;

pub use actions::Action;
pub use handler::{handle_event, Event};
pub use modes::{DeleteTarget, Dialog};
pub use state::{AppState, Outcome};
