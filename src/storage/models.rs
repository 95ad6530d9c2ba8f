//! Row types exchanged with the store.
//!
//! These mirror the `motorcycles` and `fillups` collections as the store serializes
//! them. They are deliberately loose (optional fields, signed integers) so that any
//! row the store sends can be decoded; conversion into the domain [`Vehicle`] and
//! [`Fillup`] records is where rows are validated.

use crate::domain::error::{MileyError, Result};
use crate::domain::fillup::{is_valid_amount, FillupEdit, FillupEntry};
use crate::domain::{Fillup, Vehicle};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `motorcycles` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRow {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row of the `fillups` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillupRow {
    pub id: String,
    pub user_id: String,
    pub motorcycle_id: String,
    pub date: NaiveDate,
    pub odometer: i64,
    #[serde(default)]
    pub liters: Option<f64>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub pump_name: Option<String>,
}

/// Insert payload for the `motorcycles` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVehicleRow {
    pub user_id: String,
    pub name: String,
    pub model: Option<String>,
}

/// Insert payload for the `fillups` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFillupRow {
    pub user_id: String,
    pub motorcycle_id: String,
    pub date: NaiveDate,
    pub odometer: i64,
    pub liters: f64,
    pub cost: f64,
    pub pump_name: Option<String>,
}

impl NewFillupRow {
    /// Builds the insert payload for `entry` on behalf of `user_id`.
    #[must_use]
    pub fn from_entry(user_id: &str, entry: &FillupEntry) -> Self {
        Self {
            user_id: user_id.to_string(),
            motorcycle_id: entry.vehicle_id.clone(),
            date: entry.date,
            odometer: i64::from(entry.odometer),
            liters: entry.liters,
            cost: entry.cost,
            pump_name: entry.pump_name.clone(),
        }
    }
}

/// Full-field update payload for a fillup.
///
/// Every editable column is always sent; `pump_name` is serialized as `null` when
/// cleared so the store overwrites the previous value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillupChanges {
    pub date: NaiveDate,
    pub odometer: i64,
    pub liters: f64,
    pub cost: f64,
    pub pump_name: Option<String>,
}

impl From<&FillupEdit> for FillupChanges {
    fn from(edit: &FillupEdit) -> Self {
        Self {
            date: edit.date,
            odometer: i64::from(edit.odometer),
            liters: edit.liters,
            cost: edit.cost,
            pump_name: edit.pump_name(),
        }
    }
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = MileyError;

    fn try_from(row: VehicleRow) -> Result<Self> {
        if row.id.is_empty() {
            return Err(MileyError::InvalidRecord("motorcycle row without id".to_string()));
        }

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name.unwrap_or_default(),
            model: row.model.filter(|m| !m.is_empty()),
            created_at: row.created_at,
        })
    }
}

impl TryFrom<FillupRow> for Fillup {
    type Error = MileyError;

    fn try_from(row: FillupRow) -> Result<Self> {
        if row.id.is_empty() {
            return Err(MileyError::InvalidRecord("fillup row without id".to_string()));
        }

        let odometer = u32::try_from(row.odometer).map_err(|_| {
            MileyError::InvalidRecord(format!(
                "fillup {} has out-of-range odometer {}",
                row.id, row.odometer
            ))
        })?;
        let liters = non_negative(&row.id, "liters", row.liters)?;
        let cost = non_negative(&row.id, "cost", row.cost)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            vehicle_id: row.motorcycle_id,
            date: row.date,
            odometer,
            liters,
            cost,
            pump_name: row.pump_name,
        })
    }
}

/// Coerces a nullable numeric column; `null` reads as zero.
fn non_negative(id: &str, column: &str, value: Option<f64>) -> Result<f64> {
    let value = value.unwrap_or_default();
    if is_valid_amount(value) {
        Ok(value)
    } else {
        Err(MileyError::InvalidRecord(format!(
            "fillup {id} has invalid {column} {value}"
        )))
    }
}

/// Converts a batch of rows, failing on the first invalid one.
///
/// # Errors
///
/// Returns [`MileyError::InvalidRecord`] for the first row that fails validation.
pub fn into_records<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = MileyError>,
{
    rows.into_iter().map(T::try_from).collect()
}
