//! Persistence of the file-backed store across reopen.

use chrono::NaiveDate;
use miley::app::{AppState, Outcome};
use miley::domain::{SessionUser, VehicleForm};
use miley::storage::models::{NewFillupRow, NewVehicleRow};
use miley::storage::{JsonStore, RemoteStore};
use tempfile::TempDir;

fn local() -> SessionUser {
    SessionUser {
        id: "local".into(),
        email: None,
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn open(dir: &TempDir) -> JsonStore {
    JsonStore::open(dir.path().join("data").join("miley.json"), local()).unwrap()
}

#[test]
fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open(&dir);
    let mut state = AppState::new(local(), today());
    state.load(&store).unwrap();

    state.vehicle_form = VehicleForm::new("Scrambler", "");
    assert_eq!(state.create_vehicle(&mut store).unwrap(), Outcome::Applied);
    let bike = state.vehicles[0].id.clone();

    state.fillup_form.vehicle_id = Some(bike.clone());
    state.fillup_form.odometer = Some(3_200);
    state.fillup_form.liters = Some(6.5);
    state.fillup_form.pump_name = "Indian Oil".into();
    assert_eq!(state.create_fillup(&mut store).unwrap(), Outcome::Applied);
    drop(store);

    let reopened = open(&dir);
    let mut fresh = AppState::new(local(), today());
    fresh.load(&reopened).unwrap();

    assert_eq!(fresh.vehicles.len(), 1);
    assert_eq!(fresh.vehicles[0].model, None);
    assert_eq!(fresh.fillups.len(), 1);
    assert_eq!(fresh.fillups[0].vehicle_id, bike);
    assert_eq!(fresh.fillups[0].cost, 650.0);
    assert_eq!(fresh.fillups[0].pump_name.as_deref(), Some("Indian Oil"));
}

#[test]
fn fillups_list_in_date_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open(&dir);
    let vehicle = store
        .insert_vehicle(&NewVehicleRow {
            user_id: "local".into(),
            name: "Scrambler".into(),
            model: None,
        })
        .unwrap();

    for (day, odometer) in [(20, 900), (3, 100), (11, 500)] {
        store
            .insert_fillup(&NewFillupRow {
                user_id: "local".into(),
                motorcycle_id: vehicle.id.clone(),
                date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
                odometer,
                liters: 5.0,
                cost: 500.0,
                pump_name: None,
            })
            .unwrap();
    }

    let odometers: Vec<i64> = store
        .list_fillups()
        .unwrap()
        .into_iter()
        .map(|f| f.odometer)
        .collect();
    assert_eq!(odometers, [100, 500, 900]);
}

#[test]
fn rows_for_another_user_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open(&dir);

    let result = store.insert_vehicle(&NewVehicleRow {
        user_id: "intruder".into(),
        name: "Stolen".into(),
        model: None,
    });

    assert!(result.is_err());
    assert!(store.list_vehicles().unwrap().is_empty());
    assert!(!store.path().exists());
}

#[test]
fn vehicle_with_fillups_cannot_be_deleted_directly() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open(&dir);
    let mut state = AppState::new(local(), today());
    state.vehicle_form = VehicleForm::new("Scrambler", "400X");
    state.create_vehicle(&mut store).unwrap();
    let bike = state.vehicles[0].id.clone();
    state.fillup_form.vehicle_id = Some(bike.clone());
    state.fillup_form.odometer = Some(10);
    state.fillup_form.cost = Some(100.0);
    state.create_fillup(&mut store).unwrap();

    assert!(store.delete_vehicle(&bike).is_err());

    state.delete_vehicle(&mut store, &bike).unwrap();
    let reopened = open(&dir);
    assert!(reopened.list_vehicles().unwrap().is_empty());
    assert!(reopened.list_fillups().unwrap().is_empty());
}

#[test]
fn corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("miley.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(JsonStore::open(path, local()).is_err());
}

#[test]
fn negative_amounts_never_reach_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open(&dir);
    let mut state = AppState::new(local(), today());
    state.load(&store).unwrap();

    state.vehicle_form = VehicleForm::new("Scrambler", "");
    assert_eq!(state.create_vehicle(&mut store).unwrap(), Outcome::Applied);
    let bike = state.vehicles[0].id.clone();

    state.fillup_form.vehicle_id = Some(bike.clone());
    state.fillup_form.odometer = Some(3_200);
    state.fillup_form.liters = Some(-5.0);
    assert_eq!(state.create_fillup(&mut store).unwrap(), Outcome::Skipped);
    assert!(state.fillups.is_empty());

    state.fillup_form.liters = Some(5.0);
    assert_eq!(state.create_fillup(&mut store).unwrap(), Outcome::Applied);
    let id = state.fillups[0].id.clone();

    assert!(state.begin_edit(&id));
    if let Some(edit) = state.editing.as_mut() {
        edit.cost = f64::NAN;
    }
    assert_eq!(state.update_fillup(&mut store).unwrap(), Outcome::Skipped);
    if let Some(edit) = state.editing.as_mut() {
        edit.cost = -100.0;
    }
    assert_eq!(state.update_fillup(&mut store).unwrap(), Outcome::Skipped);
    drop(store);

    let reopened = open(&dir);
    let mut fresh = AppState::new(local(), today());
    fresh.load(&reopened).unwrap();

    assert_eq!(fresh.vehicles.len(), 1);
    assert_eq!(fresh.fillups.len(), 1);
    assert_eq!(fresh.fillups[0].liters, 5.0);
    assert_eq!(fresh.fillups[0].cost, 500.0);
}
