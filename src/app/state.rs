//! Application state and the commands that keep it in sync with the store.
//!
//! [`AppState`] is an in-memory mirror of the signed-in user's vehicles and fillups. It
//! is owned by the caller and handed to the command methods by reference, together
//! with the [`RemoteStore`] to talk to.
//!
//! # Write discipline
//!
//! Every command issues its remote request(s) first and only touches memory once all of
//! them have succeeded. A failed command leaves the mirror exactly as it was and returns
//! an [`Operation`](crate::domain::MileyError::Operation) error naming what was aborted.
//! Form input that is not complete enough to submit is not an error: the command
//! returns [`Outcome::Skipped`] and does nothing.

use super::modes::{DeleteTarget, Dialog};
use crate::domain::error::{Operation, Result};
use crate::domain::mileage;
use crate::domain::{Fillup, FillupDraft, FillupEdit, SessionUser, Vehicle, VehicleForm};
use crate::storage::models::{self, FillupChanges, NewFillupRow, NewVehicleRow};
use crate::storage::RemoteStore;
use crate::ui::viewmodel::{
    DashboardViewModel, EmptyState, FillupLine, HeaderInfo, QuickStats, VehicleCard,
};
use crate::ui::helpers;
use chrono::NaiveDate;

/// en-IN short date, e.g. `5/3/2024`.
pub const DEFAULT_DATE_FORMAT: &str = "%-d/%-m/%Y";

/// Result of a command that may decline to run on incomplete input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The store was updated and memory now mirrors it.
    Applied,
    /// Input was incomplete; nothing was sent.
    Skipped,
}

/// In-memory mirror of one user's data plus transient form state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The signed-in user. Owner of every row created through this state.
    pub user: SessionUser,

    /// Vehicles in the order the store returned them (creation order), then appended.
    pub vehicles: Vec<Vehicle>,

    /// Fillups in load order, then appended. Chronological views sort stably by date.
    pub fillups: Vec<Fillup>,

    pub vehicle_form: VehicleForm,
    pub fillup_form: FillupDraft,

    /// The fillup being edited, if any.
    pub editing: Option<FillupEdit>,

    pub dialog: Dialog,

    /// Set once the initial load has succeeded.
    pub loaded: bool,

    /// Current calendar date; new fillups default to it.
    pub today: NaiveDate,

    /// chrono format string used for displayed and exported dates.
    pub date_format: String,
}

impl AppState {
    /// Creates an empty state for `user`. Call [`AppState::load`] before rendering.
    #[must_use]
    pub fn new(user: SessionUser, today: NaiveDate) -> Self {
        Self {
            user,
            vehicles: Vec::new(),
            fillups: Vec::new(),
            vehicle_form: VehicleForm::default(),
            fillup_form: FillupDraft::new(today),
            editing: None,
            dialog: Dialog::Closed,
            loaded: false,
            today,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    /// Replaces the date format used for display and export.
    #[must_use]
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    /// Fetches vehicles then fillups and replaces the mirror with them.
    ///
    /// # Errors
    ///
    /// Returns a `loading data` operation error if either request fails or a row does
    /// not validate. The mirror is left empty in that case.
    pub fn load(&mut self, store: &dyn RemoteStore) -> Result<()> {
        let _span = tracing::debug_span!("load", user_id = %self.user.id).entered();

        let fetched = store
            .list_vehicles()
            .and_then(models::into_records::<_, Vehicle>)
            .and_then(|vehicles| {
                let fillups = store
                    .list_fillups()
                    .and_then(models::into_records::<_, Fillup>)?;
                Ok((vehicles, fillups))
            });

        match fetched {
            Ok((vehicles, fillups)) => {
                tracing::debug!(
                    vehicles = vehicles.len(),
                    fillups = fillups.len(),
                    "data loaded"
                );
                self.vehicles = vehicles;
                self.fillups = fillups;
                self.loaded = true;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load data");
                self.vehicles.clear();
                self.fillups.clear();
                self.loaded = false;
                Err(e.during(Operation::LoadData))
            }
        }
    }

    /// Submits the vehicle form.
    ///
    /// # Errors
    ///
    /// Returns an `adding motorcycle` operation error if the store rejects the insert.
    pub fn create_vehicle(&mut self, store: &mut dyn RemoteStore) -> Result<Outcome> {
        let Some(name) = self.vehicle_form.trimmed_name() else {
            tracing::debug!("vehicle name empty, skipping");
            return Ok(Outcome::Skipped);
        };

        let row = NewVehicleRow {
            user_id: self.user.id.clone(),
            name: name.to_string(),
            model: self.vehicle_form.trimmed_model().map(str::to_string),
        };

        let _span = tracing::debug_span!("create_vehicle", name = %row.name).entered();
        let vehicle = store
            .insert_vehicle(&row)
            .and_then(Vehicle::try_from)
            .map_err(|e| e.during(Operation::AddVehicle))?;

        tracing::info!(vehicle_id = %vehicle.id, "vehicle added");
        self.vehicles.push(vehicle);
        self.vehicle_form = VehicleForm::default();
        Ok(Outcome::Applied)
    }

    /// Submits the fillup form, estimating whichever of liters or cost was left blank.
    ///
    /// # Errors
    ///
    /// Returns an `adding fillup` operation error if the store rejects the insert.
    pub fn create_fillup(&mut self, store: &mut dyn RemoteStore) -> Result<Outcome> {
        let Some(entry) = self.fillup_form.to_entry() else {
            tracing::debug!("fillup form incomplete, skipping");
            return Ok(Outcome::Skipped);
        };

        let row = NewFillupRow::from_entry(&self.user.id, &entry);
        let _span = tracing::debug_span!(
            "create_fillup",
            vehicle_id = %row.motorcycle_id,
            odometer = row.odometer
        )
        .entered();

        let fillup = store
            .insert_fillup(&row)
            .and_then(Fillup::try_from)
            .map_err(|e| e.during(Operation::AddFillup))?;

        tracing::info!(fillup_id = %fillup.id, "fillup added");
        self.fillups.push(fillup);
        self.fillup_form.reset_keeping_vehicle(self.today);
        Ok(Outcome::Applied)
    }

    /// Starts editing a fillup. Returns `false` when no fillup has that id.
    pub fn begin_edit(&mut self, fillup_id: &str) -> bool {
        match self.fillups.iter().find(|f| f.id == fillup_id) {
            Some(fillup) => {
                self.editing = Some(FillupEdit::from(fillup));
                true
            }
            None => {
                tracing::debug!(fillup_id, "edit requested for unknown fillup");
                false
            }
        }
    }

    /// Sends the edit in progress as a full update of the fillup.
    ///
    /// An edit with negative or non-finite liters or cost is skipped and stays open.
    ///
    /// # Errors
    ///
    /// Returns an `updating fillup` operation error if the store rejects the update.
    pub fn update_fillup(&mut self, store: &mut dyn RemoteStore) -> Result<Outcome> {
        let Some(edit) = self.editing.as_ref() else {
            return Ok(Outcome::Skipped);
        };
        if !edit.is_submittable() {
            tracing::debug!(fillup_id = %edit.id, "edit has invalid amounts");
            return Ok(Outcome::Skipped);
        }

        let _span = tracing::debug_span!("update_fillup", fillup_id = %edit.id).entered();
        let changes = FillupChanges::from(edit);
        let updated = store
            .update_fillup(&edit.id, &changes)
            .and_then(Fillup::try_from)
            .map_err(|e| e.during(Operation::UpdateFillup))?;

        if let Some(slot) = self.fillups.iter_mut().find(|f| f.id == updated.id) {
            *slot = updated;
        }
        self.editing = None;
        tracing::info!("fillup updated");
        Ok(Outcome::Applied)
    }

    /// Deletes a vehicle and all of its fillups.
    ///
    /// The fillups are deleted first, then the vehicle, as two separate requests. If the
    /// second request fails the store keeps the vehicle without its fillups, while memory
    /// still holds both.
    ///
    /// # Errors
    ///
    /// Returns a `deleting motorcycle` operation error if either request fails.
    pub fn delete_vehicle(&mut self, store: &mut dyn RemoteStore, vehicle_id: &str) -> Result<()> {
        let _span = tracing::debug_span!("delete_vehicle", vehicle_id).entered();

        store
            .delete_fillups_for_vehicle(vehicle_id)
            .map_err(|e| e.during(Operation::DeleteVehicle))?;

        if let Err(e) = store.delete_vehicle(vehicle_id) {
            tracing::warn!(
                error = %e,
                "fillups were deleted but the vehicle was not; store is partially updated"
            );
            return Err(e.during(Operation::DeleteVehicle));
        }

        let before = self.fillups.len();
        self.fillups.retain(|f| f.vehicle_id != vehicle_id);
        self.vehicles.retain(|v| v.id != vehicle_id);
        if self
            .fillup_form
            .vehicle_id
            .as_deref()
            .is_some_and(|id| id == vehicle_id)
        {
            self.fillup_form.vehicle_id = None;
        }
        tracing::info!(fillups_removed = before - self.fillups.len(), "vehicle deleted");
        Ok(())
    }

    /// Deletes one fillup.
    ///
    /// # Errors
    ///
    /// Returns a `deleting fillup` operation error if the store rejects the delete.
    pub fn delete_fillup(&mut self, store: &mut dyn RemoteStore, fillup_id: &str) -> Result<()> {
        let _span = tracing::debug_span!("delete_fillup", fillup_id).entered();

        store
            .delete_fillup(fillup_id)
            .map_err(|e| e.during(Operation::DeleteFillup))?;

        self.fillups.retain(|f| f.id != fillup_id);
        if self.editing.as_ref().is_some_and(|e| e.id == fillup_id) {
            self.editing = None;
        }
        tracing::info!("fillup deleted");
        Ok(())
    }

    /// Ends the session.
    ///
    /// # Errors
    ///
    /// Returns a `signing out` operation error if the auth service rejects the request.
    pub fn sign_out(&mut self, store: &mut dyn RemoteStore) -> Result<()> {
        store
            .sign_out()
            .map_err(|e| e.during(Operation::SignOut))?;
        tracing::info!(user_id = %self.user.id, "signed out");
        Ok(())
    }

    #[must_use]
    pub fn vehicle(&self, vehicle_id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == vehicle_id)
    }

    /// Fillups of one vehicle in chronological order.
    #[must_use]
    pub fn vehicle_history(&self, vehicle_id: &str) -> Vec<&Fillup> {
        mileage::vehicle_history(&self.fillups, vehicle_id)
    }

    /// Mileage recorded at this fillup, measured from its predecessor.
    #[must_use]
    pub fn mileage_of(&self, fillup_id: &str) -> Option<f64> {
        mileage::mileage_for(&self.fillups, fillup_id)
    }

    #[must_use]
    pub fn average_mileage(&self, vehicle_id: &str) -> Option<f64> {
        mileage::average(&self.fillups, vehicle_id)
    }

    /// Sum of the cost of every fillup.
    #[must_use]
    pub fn total_spent(&self) -> f64 {
        self.fillups.iter().map(|f| f.cost).sum()
    }

    /// Confirmation prompt for a delete, or `None` if the target no longer exists.
    #[must_use]
    pub fn delete_prompt(&self, target: &DeleteTarget) -> Option<String> {
        match target {
            DeleteTarget::Vehicle(id) => self.vehicle(id).map(|v| {
                format!(
                    "Are you sure you want to delete \"{}\"? This will also delete all \
                     associated fillup records. This action cannot be undone.",
                    v.label()
                )
            }),
            DeleteTarget::Fillup(id) => self.fillups.iter().any(|f| &f.id == id).then(|| {
                "Are you sure you want to delete this fillup record? This action cannot be \
                 undone."
                    .to_string()
            }),
        }
    }

    /// Builds the dashboard from the current mirror.
    #[must_use]
    pub fn compute_viewmodel(&self) -> DashboardViewModel {
        let cards: Vec<VehicleCard> = self
            .vehicles
            .iter()
            .map(|vehicle| self.vehicle_card(vehicle))
            .collect();

        let empty_state = cards.is_empty().then(|| EmptyState {
            message: "No vehicles yet".to_string(),
            hint: "Add your first motorcycle to start tracking fuel mileage".to_string(),
        });

        DashboardViewModel {
            header: HeaderInfo {
                title: "Motorcycle Mileage Tracker".to_string(),
                greeting: self.user.email.as_ref().map(|email| format!("Welcome, {email}")),
            },
            stats: QuickStats {
                vehicles: self.vehicles.len(),
                fillups: self.fillups.len(),
                total_spent: helpers::format_rupees(self.total_spent()),
            },
            cards,
            empty_state,
            can_add_fillup: !self.vehicles.is_empty(),
        }
    }

    fn vehicle_card(&self, vehicle: &Vehicle) -> VehicleCard {
        let history = self.vehicle_history(&vehicle.id);
        let lines: Vec<FillupLine> = history
            .iter()
            .enumerate()
            .map(|(index, fillup)| {
                let previous = index.checked_sub(1).and_then(|i| history.get(i)).copied();
                FillupLine {
                    id: fillup.id.clone(),
                    date: helpers::format_date(fillup.date, &self.date_format),
                    odometer: fillup.odometer,
                    liters: format!("{:.2}", fillup.liters),
                    cost: format!("{:.2}", fillup.cost),
                    mileage: mileage::display(mileage::instantaneous(fillup, previous)),
                    pump: fillup.pump_label().to_string(),
                }
            })
            .collect();

        VehicleCard {
            id: vehicle.id.clone(),
            title: vehicle.label(),
            fillup_count: lines.len(),
            average: self.average_mileage(&vehicle.id).map(|avg| format!("{avg:.2}")),
            empty_message: lines
                .is_empty()
                .then(|| "No fillups recorded for this vehicle".to_string()),
            lines,
        }
    }
}
