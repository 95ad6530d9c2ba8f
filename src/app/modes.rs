//! Dialog state for the dashboard.
//!
//! At most one dialog is open at a time. Forms keep their contents in
//! [`AppState`](super::AppState) so that cancelling a dialog and reopening it shows the
//! same input.

/// Record targeted by a pending delete confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// A vehicle, together with all of its fillups.
    Vehicle(String),
    /// A single fillup.
    Fillup(String),
}

/// The dialog currently shown on top of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Dialog {
    #[default]
    Closed,
    AddVehicle,
    AddFillup,
    /// Editing the fillup held in `AppState::editing`.
    EditFillup,
    /// Waiting for the user to confirm a destructive delete.
    ConfirmDelete(DeleteTarget),
}

impl Dialog {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}
