//! Error types for the mileage tracker.
//!
//! This module defines the centralized error type [`MileyError`] and a type alias
//! [`Result`] for convenient error handling throughout the crate. All errors are
//! implemented using the `thiserror` crate for automatic `Error` trait implementation.

use std::fmt;
use thiserror::Error;

/// User-initiated operations whose failures are surfaced as alerts.
///
/// The display form is the gerund used in the alert text, so a failed insert of a
/// fillup reads `Error adding fillup: ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadData,
    AddVehicle,
    AddFillup,
    UpdateFillup,
    DeleteVehicle,
    DeleteFillup,
    SignOut,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::LoadData => "loading data",
            Self::AddVehicle => "adding motorcycle",
            Self::AddFillup => "adding fillup",
            Self::UpdateFillup => "updating fillup",
            Self::DeleteVehicle => "deleting motorcycle",
            Self::DeleteFillup => "deleting fillup",
            Self::SignOut => "signing out",
        };
        f.write_str(verb)
    }
}

/// The main error type for mileage tracker operations.
///
/// Consolidates failures from the remote store, the local file store, record
/// validation at the storage boundary, and configuration loading. Variants wrapping
/// external crate errors use `#[from]` for automatic conversion.
///
/// # Examples
///
/// ```
/// use miley::domain::{MileyError, Operation};
///
/// let err = MileyError::Remote { status: 401, message: "JWT expired".to_string() };
/// let alert = err.during(Operation::AddFillup);
/// assert_eq!(alert.to_string(), "Error adding fillup: JWT expired");
/// ```
#[derive(Debug, Error)]
pub enum MileyError {
    /// Local storage operation failed.
    ///
    /// Raised by the file-backed store when its data file cannot be parsed or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The remote store answered with a non-success status.
    ///
    /// `message` is the description extracted from the response body, which is what
    /// users see in alerts.
    #[error("{message}")]
    Remote {
        /// HTTP status code of the failed request.
        status: u16,
        /// Human-readable description reported by the store.
        message: String,
    },

    /// The HTTP transport failed before a response was received.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// No authenticated session is available, or the auth service rejected it.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A row coming from the store could not be converted into a typed record.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A record addressed by id does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A user-initiated operation failed; renders as an alert message.
    #[error("Error {operation}: {source}")]
    Operation {
        /// The operation that was aborted.
        operation: Operation,
        /// The underlying failure.
        #[source]
        source: Box<MileyError>,
    },
}

impl MileyError {
    /// Wraps this error with the user operation it aborted.
    #[must_use]
    pub fn during(self, operation: Operation) -> Self {
        Self::Operation {
            operation,
            source: Box::new(self),
        }
    }
}

/// A specialized `Result` type for mileage tracker operations.
pub type Result<T> = std::result::Result<T, MileyError>;
