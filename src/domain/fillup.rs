//! Fillup domain model and entry-time policies.
//!
//! A [`Fillup`] records one refueling of one vehicle. New fillups are entered through a
//! [`FillupDraft`], which enforces the submission rules and fills in whichever of
//! volume or cost was left out using [`ASSUMED_UNIT_PRICE`]. Existing fillups are edited
//! through a [`FillupEdit`], which always carries every editable field.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Price per liter used to estimate a missing volume or cost at entry time.
///
/// A fixed placeholder, not a pricing lookup.
pub const ASSUMED_UNIT_PRICE: f64 = 100.0;

/// Label used in place of a missing pump name.
pub const UNSPECIFIED_PUMP: &str = "Not specified";

/// One refueling event for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fillup {
    pub id: String,
    pub user_id: String,
    pub vehicle_id: String,
    pub date: NaiveDate,
    /// Odometer reading in kilometres.
    pub odometer: u32,
    pub liters: f64,
    pub cost: f64,
    pub pump_name: Option<String>,
}

impl Fillup {
    /// Returns the pump name, or `Not specified` when none was recorded.
    #[must_use]
    pub fn pump_label(&self) -> &str {
        self.pump_name
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(UNSPECIFIED_PUMP)
    }
}

/// A validated fillup ready to be submitted to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct FillupEntry {
    pub vehicle_id: String,
    pub date: NaiveDate,
    pub odometer: u32,
    pub liters: f64,
    pub cost: f64,
    pub pump_name: Option<String>,
}

/// Entry form for a new fillup.
///
/// Fields are optional because users fill them in piecemeal; [`FillupDraft::to_entry`]
/// decides whether the draft is complete enough to submit.
#[derive(Debug, Clone, PartialEq)]
pub struct FillupDraft {
    pub vehicle_id: Option<String>,
    pub date: NaiveDate,
    pub odometer: Option<u32>,
    pub liters: Option<f64>,
    pub cost: Option<f64>,
    pub pump_name: String,
}

impl FillupDraft {
    /// Creates an empty draft dated `today`.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            vehicle_id: None,
            date: today,
            odometer: None,
            liters: None,
            cost: None,
            pump_name: String::new(),
        }
    }

    /// Creates an empty draft with `vehicle_id` preselected.
    #[must_use]
    pub fn for_vehicle(vehicle_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            vehicle_id: Some(vehicle_id.into()),
            ..Self::new(today)
        }
    }

    /// Converts the draft into a submittable entry.
    ///
    /// Returns `None` unless a vehicle is selected, an odometer reading is present and
    /// at least one of liters or cost is present. Any liters or cost given must pass
    /// [`is_valid_amount`]. Missing values are estimated with [`estimate_missing`].
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use miley::domain::FillupDraft;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    /// let mut draft = FillupDraft::for_vehicle("b1", today);
    /// draft.odometer = Some(1200);
    /// draft.cost = Some(200.0);
    ///
    /// let entry = draft.to_entry().unwrap();
    /// assert_eq!(entry.liters, 2.0);
    /// ```
    #[must_use]
    pub fn to_entry(&self) -> Option<FillupEntry> {
        let vehicle_id = self.vehicle_id.as_deref().filter(|id| !id.is_empty())?;
        let odometer = self.odometer?;
        if self.liters.is_none() && self.cost.is_none() {
            return None;
        }
        if !self.liters.into_iter().chain(self.cost).all(is_valid_amount) {
            return None;
        }

        let (liters, cost) = estimate_missing(
            self.liters.unwrap_or_default(),
            self.cost.unwrap_or_default(),
        );

        Some(FillupEntry {
            vehicle_id: vehicle_id.to_string(),
            date: self.date,
            odometer,
            liters,
            cost,
            pump_name: trimmed_or_none(&self.pump_name),
        })
    }

    /// Clears the transient fields and re-dates the draft, keeping the selected vehicle.
    pub fn reset_keeping_vehicle(&mut self, today: NaiveDate) {
        let vehicle_id = self.vehicle_id.take();
        *self = Self {
            vehicle_id,
            ..Self::new(today)
        };
    }
}

/// Full-field edit of an existing fillup.
#[derive(Debug, Clone, PartialEq)]
pub struct FillupEdit {
    pub id: String,
    pub date: NaiveDate,
    pub odometer: u32,
    pub liters: f64,
    pub cost: f64,
    pub pump_name: String,
}

impl FillupEdit {
    /// Normalized pump name: trimmed, `None` when blank.
    #[must_use]
    pub fn pump_name(&self) -> Option<String> {
        trimmed_or_none(&self.pump_name)
    }

    /// Whether the edited liters and cost can be stored.
    #[must_use]
    pub fn is_submittable(&self) -> bool {
        is_valid_amount(self.liters) && is_valid_amount(self.cost)
    }
}

impl From<&Fillup> for FillupEdit {
    fn from(fillup: &Fillup) -> Self {
        Self {
            id: fillup.id.clone(),
            date: fillup.date,
            odometer: fillup.odometer,
            liters: fillup.liters,
            cost: fillup.cost,
            pump_name: fillup.pump_name.clone().unwrap_or_default(),
        }
    }
}

/// Fills in whichever of `liters` and `cost` is zero from the other one.
///
/// Uses [`ASSUMED_UNIT_PRICE`]; when both are zero or both are set, they are returned
/// unchanged.
///
/// ```
/// use miley::domain::fillup::estimate_missing;
///
/// assert_eq!(estimate_missing(5.0, 0.0), (5.0, 500.0));
/// assert_eq!(estimate_missing(0.0, 200.0), (2.0, 200.0));
/// ```
#[must_use]
pub fn estimate_missing(liters: f64, cost: f64) -> (f64, f64) {
    if liters == 0.0 && cost != 0.0 {
        (cost / ASSUMED_UNIT_PRICE, cost)
    } else if cost == 0.0 && liters != 0.0 {
        (liters, liters * ASSUMED_UNIT_PRICE)
    } else {
        (liters, cost)
    }
}

/// Whether `value` is acceptable as a liters or cost figure: finite and not negative.
///
/// The store enforces the same rule when rows are read back.
#[must_use]
pub fn is_valid_amount(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn trimmed_or_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
