//! Fuel efficiency calculations.
//!
//! Mileage is derived on demand from the fillup collection; nothing computed here is
//! ever stored. Every figure is in km/l and rounded to two decimals.
//!
//! # Algorithm
//!
//! A fillup's instantaneous mileage uses the distance covered since the previous
//! fillup of the same vehicle and the fuel put in at that previous fillup, i.e. the
//! fuel burned to cover that distance. The average over a vehicle's history divides
//! the total distance by the fuel of every fillup except the last one.

use crate::domain::fillup::Fillup;
use std::collections::HashMap;

/// Rounds to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes the mileage of `current` relative to the fillup before it.
///
/// Returns `None` when there is no previous fillup, when the distance is zero or
/// negative (odometer regression or data-entry error), or when the previous fillup has
/// no fuel volume.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use miley::domain::Fillup;
/// use miley::domain::mileage::instantaneous;
///
/// let fillup = |id: &str, odometer, liters| Fillup {
///     id: id.into(),
///     user_id: "u1".into(),
///     vehicle_id: "b1".into(),
///     date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     odometer,
///     liters,
///     cost: 0.0,
///     pump_name: None,
/// };
///
/// let previous = fillup("f1", 1000, 3.0);
/// let current = fillup("f2", 1130, 4.0);
/// assert_eq!(instantaneous(&current, Some(&previous)), Some(43.33));
/// assert_eq!(instantaneous(&current, None), None);
/// ```
#[must_use]
pub fn instantaneous(current: &Fillup, previous: Option<&Fillup>) -> Option<f64> {
    let previous = previous?;
    let distance = f64::from(current.odometer) - f64::from(previous.odometer);
    let mileage = distance / previous.liters;

    (mileage.is_finite() && mileage > 0.0).then(|| round2(mileage))
}

/// Returns the fillups of one vehicle in chronological order.
///
/// Fillups sharing a date keep their relative order from `fillups`.
#[must_use]
pub fn vehicle_history<'a>(fillups: &'a [Fillup], vehicle_id: &str) -> Vec<&'a Fillup> {
    let mut history: Vec<&Fillup> = fillups
        .iter()
        .filter(|f| f.vehicle_id == vehicle_id)
        .collect();
    history.sort_by_key(|f| f.date);
    history
}

/// Computes the mileage of the fillup with id `fillup_id` against its predecessor in
/// its own vehicle's chronological history.
#[must_use]
pub fn mileage_for(fillups: &[Fillup], fillup_id: &str) -> Option<f64> {
    let fillup = fillups.iter().find(|f| f.id == fillup_id)?;
    let history = vehicle_history(fillups, &fillup.vehicle_id);
    let index = history.iter().position(|f| f.id == fillup_id)?;
    let previous = index.checked_sub(1).and_then(|i| history.get(i).copied());

    instantaneous(fillup, previous)
}

/// Computes the mileage of every fillup in one pass, keyed by fillup id.
///
/// Gives the same figures as [`mileage_for`] on each fillup, without re-sorting a
/// vehicle's history per lookup.
#[must_use]
pub fn mileage_by_fillup(fillups: &[Fillup]) -> HashMap<&str, Option<f64>> {
    let mut chronological: Vec<&Fillup> = fillups.iter().collect();
    chronological.sort_by_key(|f| f.date);

    let mut latest: HashMap<&str, &Fillup> = HashMap::new();
    let mut mileages = HashMap::with_capacity(fillups.len());
    for fillup in chronological {
        let previous = latest.insert(fillup.vehicle_id.as_str(), fillup);
        mileages
            .entry(fillup.id.as_str())
            .or_insert_with(|| instantaneous(fillup, previous));
    }
    mileages
}

/// Computes the average mileage of a vehicle over its whole history.
///
/// Requires at least two fillups. Returns `None` when the fuel of all but the last
/// fillup sums to zero. Unlike [`instantaneous`], a non-positive average is reported
/// as-is.
#[must_use]
pub fn average(fillups: &[Fillup], vehicle_id: &str) -> Option<f64> {
    let history = vehicle_history(fillups, vehicle_id);
    if history.len() < 2 {
        return None;
    }

    let (total_distance, total_fuel) = history
        .windows(2)
        .fold((0.0, 0.0), |(distance, fuel), pair| {
            (
                distance + f64::from(pair[1].odometer) - f64::from(pair[0].odometer),
                fuel + pair[0].liters,
            )
        });

    tracing::trace!(vehicle_id, total_distance, total_fuel, "average mileage inputs");

    (total_fuel > 0.0).then(|| round2(total_distance / total_fuel))
}

/// Formats an optional mileage figure, using `N/A` when unavailable.
#[must_use]
pub fn display(mileage: Option<f64>) -> String {
    mileage.map_or_else(|| "N/A".to_string(), |m| format!("{m:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fillup(id: &str, vehicle: &str, day: u32, odometer: u32, liters: f64) -> Fillup {
        Fillup {
            id: id.into(),
            user_id: "user".into(),
            vehicle_id: vehicle.into(),
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            odometer,
            liters,
            cost: liters * 100.0,
            pump_name: None,
        }
    }

    #[test]
    fn instantaneous_divides_distance_by_previous_fuel() {
        let previous = fillup("a", "bike", 1, 10_000, 8.0);
        let current = fillup("b", "bike", 5, 10_350, 6.0);
        assert_eq!(instantaneous(&current, Some(&previous)), Some(43.75));
    }

    #[test]
    fn instantaneous_rounds_to_two_decimals() {
        let previous = fillup("a", "bike", 1, 0, 3.0);
        let current = fillup("b", "bike", 2, 100, 3.0);
        assert_eq!(instantaneous(&current, Some(&previous)), Some(33.33));
    }

    #[test]
    fn odometer_regression_is_unavailable() {
        let previous = fillup("a", "bike", 1, 5_000, 5.0);
        let same = fillup("b", "bike", 2, 5_000, 5.0);
        let lower = fillup("c", "bike", 3, 4_900, 5.0);
        assert_eq!(instantaneous(&same, Some(&previous)), None);
        assert_eq!(instantaneous(&lower, Some(&previous)), None);
    }

    #[test]
    fn zero_previous_fuel_is_unavailable_not_infinite() {
        let previous = fillup("a", "bike", 1, 5_000, 0.0);
        let current = fillup("b", "bike", 2, 5_200, 4.0);
        assert_eq!(instantaneous(&current, Some(&previous)), None);
    }

    #[test]
    fn history_is_filtered_and_sorted_by_date() {
        let fillups = vec![
            fillup("late", "bike", 20, 1_300, 5.0),
            fillup("other", "scooter", 1, 50, 2.0),
            fillup("early", "bike", 3, 1_000, 5.0),
        ];
        let ids: Vec<&str> = vehicle_history(&fillups, "bike")
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(ids, ["early", "late"]);
    }

    #[test]
    fn same_day_fillups_keep_collection_order() {
        let fillups = vec![
            fillup("first", "bike", 4, 1_000, 5.0),
            fillup("second", "bike", 4, 1_150, 5.0),
        ];
        assert_eq!(mileage_for(&fillups, "second"), Some(30.0));
        assert_eq!(mileage_for(&fillups, "first"), None);
    }

    #[test]
    fn mileage_uses_predecessor_within_same_vehicle() {
        let fillups = vec![
            fillup("b1", "bike", 1, 1_000, 4.0),
            fillup("s1", "scooter", 2, 9_000, 1.0),
            fillup("b2", "bike", 3, 1_200, 4.0),
        ];
        assert_eq!(mileage_for(&fillups, "b2"), Some(50.0));
        assert_eq!(mileage_for(&fillups, "s1"), None);
    }

    #[test]
    fn bulk_mileage_matches_per_fillup_lookup() {
        let fillups = vec![
            fillup("b3", "bike", 9, 1_500, 5.0),
            fillup("s1", "scooter", 2, 9_000, 1.0),
            fillup("b1", "bike", 1, 1_000, 4.0),
            fillup("s2", "scooter", 2, 9_045, 1.5),
            fillup("b2", "bike", 3, 1_200, 4.0),
            fillup("b4", "bike", 9, 1_450, 5.0),
        ];

        let bulk = mileage_by_fillup(&fillups);
        assert_eq!(bulk.len(), fillups.len());
        for f in &fillups {
            assert_eq!(bulk[f.id.as_str()], mileage_for(&fillups, &f.id), "{}", f.id);
        }
        assert_eq!(bulk["b2"], Some(50.0));
        assert_eq!(bulk["s2"], Some(45.0));
        assert_eq!(bulk["b4"], None);
    }

    #[test]
    fn average_needs_two_fillups() {
        let fillups = vec![fillup("a", "bike", 1, 1_000, 4.0)];
        assert_eq!(average(&fillups, "bike"), None);
        assert_eq!(average(&[], "bike"), None);
    }

    #[test]
    fn average_excludes_last_fillup_fuel() {
        let fillups = vec![
            fillup("a", "bike", 1, 1_000, 4.0),
            fillup("b", "bike", 2, 1_200, 6.0),
            fillup("c", "bike", 3, 1_500, 99.0),
        ];
        // 500 km over 10 l.
        assert_eq!(average(&fillups, "bike"), Some(50.0));
    }

    #[test]
    fn average_with_no_fuel_is_unavailable() {
        let fillups = vec![
            fillup("a", "bike", 1, 1_000, 0.0),
            fillup("b", "bike", 2, 1_200, 6.0),
        ];
        assert_eq!(average(&fillups, "bike"), None);
    }

    #[test]
    fn display_uses_na_placeholder() {
        assert_eq!(display(None), "N/A");
        assert_eq!(display(Some(42.5)), "42.50");
    }
}
