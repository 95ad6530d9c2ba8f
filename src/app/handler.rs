//! Event handling and state transitions.
//!
//! [`handle_event`] is the single entry point front ends call for every user intent.
//! It runs the matching [`AppState`] command against the store and reports what the
//! front end has to do next as a list of [`Action`]s. Store failures never escape as
//! `Err`: they become [`Action::Alert`]s carrying the operation's message, and the state
//! is left as it was.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use miley::app::{handle_event, Action, AppState, Event};
//! use miley::domain::SessionUser;
//! use miley::storage::MemoryStore;
//!
//! let user = SessionUser { id: "u1".into(), email: None };
//! let mut store = MemoryStore::new(user.clone());
//! let mut state = AppState::new(user, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
//!
//! handle_event(&mut state, &mut store, &Event::Load);
//! let (_, actions) = handle_event(&mut state, &mut store, &Event::Export);
//! assert_eq!(actions, vec![Action::Alert("No data to export!".into())]);
//! ```

use super::modes::{DeleteTarget, Dialog};
use super::state::Outcome;
use crate::app::{Action, AppState};
use crate::domain::error::Result;
use crate::domain::FillupDraft;
use crate::export;
use crate::storage::RemoteStore;

/// Notice raised when exporting an empty fillup log.
pub const NOTHING_TO_EXPORT: &str = "No data to export!";

/// User intents delivered by a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Fetches the user's data, replacing whatever is in memory.
    Load,

    OpenAddVehicle,
    /// Submits `AppState::vehicle_form`.
    SubmitVehicle,

    /// Opens the fillup form, optionally preselecting a vehicle.
    OpenAddFillup {
        vehicle_id: Option<String>,
    },
    /// Submits `AppState::fillup_form`.
    SubmitFillup,

    /// Opens the edit form for a fillup.
    EditFillup(String),
    /// Submits `AppState::editing`.
    SubmitEdit,

    /// Asks for confirmation before deleting.
    RequestDelete(DeleteTarget),
    /// Confirms the pending delete.
    ConfirmDelete,

    /// Dismisses the open dialog without submitting.
    CloseDialog,

    /// Generates the CSV export of every fillup.
    Export,

    SignOut,
}

/// Processes an event, mutates state, and returns actions for the front end.
///
/// The boolean is `true` when the state changed and the dashboard should be redrawn.
pub fn handle_event(
    state: &mut AppState,
    store: &mut dyn RemoteStore,
    event: &Event,
) -> (bool, Vec<Action>) {
    let _span = tracing::debug_span!("handle_event", event_type = ?event).entered();

    match event {
        Event::Load => surface(state.load(store).map(|()| true)),

        Event::OpenAddVehicle => {
            state.dialog = Dialog::AddVehicle;
            (true, vec![])
        }
        Event::SubmitVehicle => surface(state.create_vehicle(store).map(|outcome| {
            close_on_success(state, outcome)
        })),

        Event::OpenAddFillup { vehicle_id } => {
            if state.vehicles.is_empty() {
                tracing::debug!("no vehicles, fillup form unavailable");
                return (false, vec![]);
            }
            if let Some(id) = vehicle_id {
                state.fillup_form = FillupDraft::for_vehicle(id.clone(), state.today);
            }
            state.dialog = Dialog::AddFillup;
            (true, vec![])
        }
        Event::SubmitFillup => surface(state.create_fillup(store).map(|outcome| {
            close_on_success(state, outcome)
        })),

        Event::EditFillup(id) => {
            if !state.begin_edit(id) {
                return (false, vec![]);
            }
            state.dialog = Dialog::EditFillup;
            (true, vec![])
        }
        Event::SubmitEdit => surface(state.update_fillup(store).map(|outcome| {
            close_on_success(state, outcome)
        })),

        Event::RequestDelete(target) => {
            let Some(prompt) = state.delete_prompt(target) else {
                tracing::debug!(?target, "delete requested for unknown record");
                return (false, vec![]);
            };
            state.dialog = Dialog::ConfirmDelete(target.clone());
            (true, vec![Action::Confirm { prompt }])
        }
        Event::ConfirmDelete => {
            let Dialog::ConfirmDelete(target) = state.dialog.clone() else {
                return (false, vec![]);
            };
            let deleted = match &target {
                DeleteTarget::Vehicle(id) => state.delete_vehicle(store, id),
                DeleteTarget::Fillup(id) => state.delete_fillup(store, id),
            };
            surface(deleted.map(|()| {
                state.dialog = Dialog::Closed;
                true
            }))
        }

        Event::CloseDialog => {
            let was_open = state.dialog.is_open();
            state.dialog = Dialog::Closed;
            state.editing = None;
            (was_open, vec![])
        }

        Event::Export => {
            let download = export::export_fillups(
                &state.vehicles,
                &state.fillups,
                state.today,
                &state.date_format,
            );
            match download {
                Some(download) => (false, vec![Action::Download(download)]),
                None => (false, vec![Action::Alert(NOTHING_TO_EXPORT.to_string())]),
            }
        }

        Event::SignOut => match state.sign_out(store) {
            Ok(()) => (false, vec![Action::SignedOut]),
            Err(e) => (false, vec![Action::Alert(e.to_string())]),
        },
    }
}

fn close_on_success(state: &mut AppState, outcome: Outcome) -> bool {
    match outcome {
        Outcome::Applied => {
            state.dialog = Dialog::Closed;
            true
        }
        Outcome::Skipped => false,
    }
}

/// Turns a command result into handler output, alerting on failure.
fn surface(result: Result<bool>) -> (bool, Vec<Action>) {
    match result {
        Ok(redraw) => (redraw, vec![]),
        Err(e) => {
            tracing::warn!(error = %e, "operation failed");
            (false, vec![Action::Alert(e.to_string())])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionUser, VehicleForm};
    use crate::storage::{MemoryStore, Request};
    use chrono::NaiveDate;

    fn setup() -> (AppState, MemoryStore) {
        let user = SessionUser {
            id: "user-1".into(),
            email: None,
        };
        let store = MemoryStore::new(user.clone());
        let state = AppState::new(user, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        (state, store)
    }

    fn with_vehicle(state: &mut AppState, store: &mut MemoryStore) -> String {
        state.vehicle_form = VehicleForm::new("Daily", "Pulsar");
        handle_event(state, store, &Event::SubmitVehicle);
        state.vehicles[0].id.clone()
    }

    #[test]
    fn load_failure_alerts_once() {
        let (mut state, mut store) = setup();
        store.fail_on(Request::ListVehicles);

        let (redraw, actions) = handle_event(&mut state, &mut store, &Event::Load);

        assert!(!redraw);
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], Action::Alert(m) if m.starts_with("Error loading data:")));
        assert!(!store.requests().contains(&Request::ListFillups));
    }

    #[test]
    fn successful_submit_closes_dialog() {
        let (mut state, mut store) = setup();
        handle_event(&mut state, &mut store, &Event::OpenAddVehicle);
        assert_eq!(state.dialog, Dialog::AddVehicle);

        with_vehicle(&mut state, &mut store);
        assert_eq!(state.dialog, Dialog::Closed);
    }

    #[test]
    fn skipped_submit_keeps_dialog_open() {
        let (mut state, mut store) = setup();
        handle_event(&mut state, &mut store, &Event::OpenAddVehicle);

        let (redraw, actions) = handle_event(&mut state, &mut store, &Event::SubmitVehicle);

        assert!(!redraw);
        assert!(actions.is_empty());
        assert_eq!(state.dialog, Dialog::AddVehicle);
    }

    #[test]
    fn failed_submit_alerts_and_keeps_dialog_open() {
        let (mut state, mut store) = setup();
        handle_event(&mut state, &mut store, &Event::OpenAddVehicle);
        store.fail_on(Request::InsertVehicle);
        state.vehicle_form = VehicleForm::new("Daily", "");

        let (_, actions) = handle_event(&mut state, &mut store, &Event::SubmitVehicle);

        assert_eq!(
            actions,
            vec![Action::Alert(
                "Error adding motorcycle: simulated failure of InsertVehicle".into()
            )]
        );
        assert_eq!(state.dialog, Dialog::AddVehicle);
        assert_eq!(state.vehicle_form.name, "Daily");
    }

    #[test]
    fn add_fillup_requires_a_vehicle() {
        let (mut state, mut store) = setup();
        let event = Event::OpenAddFillup { vehicle_id: None };

        assert_eq!(handle_event(&mut state, &mut store, &event), (false, vec![]));
        assert_eq!(state.dialog, Dialog::Closed);
    }

    #[test]
    fn add_fillup_preselects_vehicle() {
        let (mut state, mut store) = setup();
        let bike = with_vehicle(&mut state, &mut store);

        let event = Event::OpenAddFillup {
            vehicle_id: Some(bike.clone()),
        };
        handle_event(&mut state, &mut store, &event);

        assert_eq!(state.dialog, Dialog::AddFillup);
        assert_eq!(state.fillup_form.vehicle_id, Some(bike));
    }

    #[test]
    fn delete_goes_through_confirmation() {
        let (mut state, mut store) = setup();
        let bike = with_vehicle(&mut state, &mut store);

        let (_, actions) = handle_event(
            &mut state,
            &mut store,
            &Event::RequestDelete(DeleteTarget::Vehicle(bike.clone())),
        );
        assert!(matches!(
            &actions[0],
            Action::Confirm { prompt } if prompt.contains("\"Daily (Pulsar)\"")
        ));
        assert_eq!(state.vehicles.len(), 1);

        handle_event(&mut state, &mut store, &Event::ConfirmDelete);
        assert!(state.vehicles.is_empty());
        assert_eq!(state.dialog, Dialog::Closed);
    }

    #[test]
    fn cancelled_delete_keeps_record() {
        let (mut state, mut store) = setup();
        let bike = with_vehicle(&mut state, &mut store);

        handle_event(
            &mut state,
            &mut store,
            &Event::RequestDelete(DeleteTarget::Vehicle(bike)),
        );
        handle_event(&mut state, &mut store, &Event::CloseDialog);
        let (redraw, _) = handle_event(&mut state, &mut store, &Event::ConfirmDelete);

        assert!(!redraw);
        assert_eq!(state.vehicles.len(), 1);
    }

    #[test]
    fn export_without_fillups_raises_notice() {
        let (mut state, mut store) = setup();
        with_vehicle(&mut state, &mut store);

        let (_, actions) = handle_event(&mut state, &mut store, &Event::Export);
        assert_eq!(actions, vec![Action::Alert(NOTHING_TO_EXPORT.into())]);
    }

    #[test]
    fn sign_out_reports_outcome() {
        let (mut state, mut store) = setup();
        store.fail_on(Request::SignOut);
        let (_, actions) = handle_event(&mut state, &mut store, &Event::SignOut);
        assert!(matches!(&actions[0], Action::Alert(m) if m.starts_with("Error signing out:")));

        store.recover(Request::SignOut);
        let (_, actions) = handle_event(&mut state, &mut store, &Event::SignOut);
        assert_eq!(actions, vec![Action::SignedOut]);
        assert!(store.is_signed_out());
    }
}
