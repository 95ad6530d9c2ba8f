//! In-process tables shared by the local store implementations.
//!
//! [`Tables`] reproduces the server-side behavior the application relies on: id and
//! timestamp assignment on insert, ascending ordering on list, and per-user row
//! filtering standing in for row-level security.

use crate::domain::error::{MileyError, Result};
use crate::storage::models::{
    FillupChanges, FillupRow, NewFillupRow, NewVehicleRow, VehicleRow,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Both collections, as persisted by [`JsonStore`](crate::storage::JsonStore).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub motorcycles: Vec<VehicleRow>,
    #[serde(default)]
    pub fillups: Vec<FillupRow>,
}

impl Tables {
    /// Rows of `motorcycles` owned by `user_id`, oldest first.
    #[must_use]
    pub fn vehicles_of(&self, user_id: &str) -> Vec<VehicleRow> {
        let mut rows: Vec<VehicleRow> = self
            .motorcycles
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|v| v.created_at);
        rows
    }

    /// Rows of `fillups` owned by `user_id`, oldest date first.
    #[must_use]
    pub fn fillups_of(&self, user_id: &str) -> Vec<FillupRow> {
        let mut rows: Vec<FillupRow> = self
            .fillups
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|f| f.date);
        rows
    }

    /// Inserts a vehicle, assigning a fresh id and creation timestamp.
    ///
    /// # Errors
    ///
    /// Rejects rows written on behalf of another user.
    pub fn insert_vehicle(&mut self, user_id: &str, row: &NewVehicleRow) -> Result<VehicleRow> {
        ensure_owner(user_id, &row.user_id)?;

        let stored = VehicleRow {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: row.user_id.clone(),
            name: Some(row.name.clone()),
            model: row.model.clone(),
            created_at: Utc::now(),
        };
        self.motorcycles.push(stored.clone());
        Ok(stored)
    }

    /// Inserts a fillup, assigning a fresh id.
    ///
    /// # Errors
    ///
    /// Rejects rows written on behalf of another user and rows referencing a vehicle
    /// the user does not own.
    pub fn insert_fillup(&mut self, user_id: &str, row: &NewFillupRow) -> Result<FillupRow> {
        ensure_owner(user_id, &row.user_id)?;

        let owns_vehicle = self
            .motorcycles
            .iter()
            .any(|v| v.id == row.motorcycle_id && v.user_id == user_id);
        if !owns_vehicle {
            return Err(MileyError::Storage(format!(
                "insert on fillups violates foreign key: motorcycle {} not found",
                row.motorcycle_id
            )));
        }

        let stored = FillupRow {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: row.user_id.clone(),
            motorcycle_id: row.motorcycle_id.clone(),
            date: row.date,
            odometer: row.odometer,
            liters: Some(row.liters),
            cost: Some(row.cost),
            pump_name: row.pump_name.clone(),
        };
        self.fillups.push(stored.clone());
        Ok(stored)
    }

    /// Overwrites the editable fields of fillup `id`.
    ///
    /// # Errors
    ///
    /// Returns [`MileyError::NotFound`] when the user owns no fillup with that id.
    pub fn update_fillup(
        &mut self,
        user_id: &str,
        id: &str,
        changes: &FillupChanges,
    ) -> Result<FillupRow> {
        let row = self
            .fillups
            .iter_mut()
            .find(|f| f.id == id && f.user_id == user_id)
            .ok_or_else(|| MileyError::NotFound(format!("fillup {id}")))?;

        row.date = changes.date;
        row.odometer = changes.odometer;
        row.liters = Some(changes.liters);
        row.cost = Some(changes.cost);
        row.pump_name.clone_from(&changes.pump_name);
        Ok(row.clone())
    }

    /// Deletes the user's fillups of `vehicle_id`; returns how many were removed.
    pub fn delete_fillups_for_vehicle(&mut self, user_id: &str, vehicle_id: &str) -> usize {
        let before = self.fillups.len();
        self.fillups
            .retain(|f| !(f.motorcycle_id == vehicle_id && f.user_id == user_id));
        before - self.fillups.len()
    }

    /// Deletes vehicle `id`. Fails while fillups still reference it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the vehicle still has fillups.
    pub fn delete_vehicle(&mut self, user_id: &str, id: &str) -> Result<usize> {
        if self.fillups.iter().any(|f| f.motorcycle_id == id) {
            return Err(MileyError::Storage(format!(
                "delete on motorcycles violates foreign key: motorcycle {id} still has fillups"
            )));
        }

        let before = self.motorcycles.len();
        self.motorcycles
            .retain(|v| !(v.id == id && v.user_id == user_id));
        Ok(before - self.motorcycles.len())
    }

    /// Deletes fillup `id`; returns how many rows were removed.
    pub fn delete_fillup(&mut self, user_id: &str, id: &str) -> usize {
        let before = self.fillups.len();
        self.fillups.retain(|f| !(f.id == id && f.user_id == user_id));
        before - self.fillups.len()
    }
}

fn ensure_owner(session_user: &str, row_user: &str) -> Result<()> {
    if session_user == row_user {
        Ok(())
    } else {
        Err(MileyError::Storage(
            "new row violates row-level security policy".to_string(),
        ))
    }
}
