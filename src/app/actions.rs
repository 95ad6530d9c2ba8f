//! Side effects requested by the event handler.
//!
//! The handler never talks to the terminal or the filesystem directly. It returns
//! [`Action`]s and the front end decides how to carry them out: a CLI prints alerts and
//! writes downloads to disk, a GUI would pop up a dialog and hand the file to the
//! browser.

use crate::export::Download;

/// Commands produced by [`handle_event`](super::handle_event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Shows a blocking message to the user, e.g. `Error adding fillup: ...`.
    Alert(String),

    /// Asks the user to confirm a destructive operation.
    ///
    /// The front end answers with `Event::ConfirmDelete` or `Event::CloseDialog`.
    Confirm {
        /// Prompt naming what will be deleted.
        prompt: String,
    },

    /// Offers a generated file to the user.
    Download(Download),

    /// The session has ended; the front end should drop any stored credentials.
    SignedOut,
}
