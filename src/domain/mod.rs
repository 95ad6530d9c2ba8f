//! Domain layer for the mileage tracker.
//!
//! Core record types and the mileage arithmetic, independent of the remote store and
//! of any presentation concerns.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`vehicle`]: The tracked motorcycle record
//! - [`fillup`]: Refueling records, entry drafts and the cost/volume estimation policy
//! - [`mileage`]: Instantaneous and average fuel efficiency

pub mod error;
pub mod fillup;
pub mod mileage;
pub mod vehicle;

pub use error::{MileyError, Operation, Result};
pub use fillup::{Fillup, FillupDraft, FillupEdit, FillupEntry, ASSUMED_UNIT_PRICE};
pub use vehicle::{SessionUser, Vehicle, VehicleForm};
