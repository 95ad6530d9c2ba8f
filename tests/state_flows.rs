//! End-to-end flows of the application state against the in-memory store.

use chrono::NaiveDate;
use miley::app::{handle_event, Action, AppState, DeleteTarget, Event, Outcome};
use miley::domain::{SessionUser, VehicleForm};
use miley::storage::{MemoryStore, RemoteStore, Request};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn rider() -> SessionUser {
    SessionUser {
        id: "rider".into(),
        email: Some("rider@example.com".into()),
    }
}

fn loaded(store: &MemoryStore) -> AppState {
    let mut state = AppState::new(rider(), day(31));
    state.load(store).unwrap();
    state
}

fn add_vehicle(state: &mut AppState, store: &mut MemoryStore, name: &str) -> String {
    state.vehicle_form = VehicleForm::new(name, "Himalayan");
    assert_eq!(state.create_vehicle(store).unwrap(), Outcome::Applied);
    state.vehicles.last().unwrap().id.clone()
}

fn add_fillup(
    state: &mut AppState,
    store: &mut MemoryStore,
    vehicle: &str,
    date: NaiveDate,
    odometer: u32,
    liters: Option<f64>,
    cost: Option<f64>,
) -> String {
    state.fillup_form.vehicle_id = Some(vehicle.to_string());
    state.fillup_form.date = date;
    state.fillup_form.odometer = Some(odometer);
    state.fillup_form.liters = liters;
    state.fillup_form.cost = cost;
    assert_eq!(state.create_fillup(store).unwrap(), Outcome::Applied);
    state.fillups.last().unwrap().id.clone()
}

#[test]
fn missing_liters_or_cost_is_estimated_at_unit_price() {
    let mut store = MemoryStore::new(rider());
    let mut state = loaded(&store);
    let bike = add_vehicle(&mut state, &mut store, "Tourer");

    add_fillup(&mut state, &mut store, &bike, day(1), 1_000, None, Some(200.0));
    add_fillup(&mut state, &mut store, &bike, day(2), 1_100, Some(5.0), None);

    assert!((state.fillups[0].liters - 2.0).abs() < 1e-9);
    assert!((state.fillups[1].cost - 500.0).abs() < 1e-9);

    let stored = store.list_fillups().unwrap();
    assert_eq!(stored[0].liters, Some(2.0));
    assert_eq!(stored[1].cost, Some(500.0));
}

#[test]
fn fillup_without_fuel_figures_is_not_submitted() {
    let mut store = MemoryStore::new(rider());
    let mut state = loaded(&store);
    let bike = add_vehicle(&mut state, &mut store, "Tourer");

    state.fillup_form.vehicle_id = Some(bike);
    state.fillup_form.odometer = Some(500);

    assert_eq!(state.create_fillup(&mut store).unwrap(), Outcome::Skipped);
    assert!(!store.requests().contains(&Request::InsertFillup));
}

#[test]
fn cascade_delete_removes_vehicle_and_all_its_fillups() {
    let mut store = MemoryStore::new(rider());
    let mut state = loaded(&store);
    let bike = add_vehicle(&mut state, &mut store, "Tourer");
    for (i, odo) in [1_000, 1_250, 1_500].into_iter().enumerate() {
        add_fillup(&mut state, &mut store, &bike, day(i as u32 + 1), odo, Some(5.0), None);
    }

    state.delete_vehicle(&mut store, &bike).unwrap();

    assert!(state.vehicles.is_empty());
    assert!(state.fillups.is_empty());
    assert!(store.tables().fillups.is_empty());
    assert!(store.tables().motorcycles.is_empty());

    let requests = store.requests();
    let cascade = &requests[requests.len() - 2..];
    assert_eq!(cascade, [Request::DeleteFillupsForVehicle, Request::DeleteVehicle]);
}

#[test]
fn partial_cascade_leaves_memory_unchanged_while_store_lost_fillups() {
    let mut store = MemoryStore::new(rider());
    let mut state = loaded(&store);
    let bike = add_vehicle(&mut state, &mut store, "Tourer");
    add_fillup(&mut state, &mut store, &bike, day(1), 1_000, Some(5.0), None);
    add_fillup(&mut state, &mut store, &bike, day(2), 1_200, Some(4.0), None);
    store.fail_on(Request::DeleteVehicle);

    let err = state.delete_vehicle(&mut store, &bike).unwrap_err();

    assert!(err.to_string().starts_with("Error deleting motorcycle: "));
    assert_eq!(state.vehicles.len(), 1);
    assert_eq!(state.fillups.len(), 2);
    assert_eq!(store.tables().motorcycles.len(), 1);
    assert!(store.tables().fillups.is_empty());

    store.recover(Request::DeleteVehicle);
    state.load(&store).unwrap();
    assert_eq!(state.vehicles.len(), 1);
    assert!(state.fillups.is_empty());
}

#[test]
fn failed_fillup_delete_step_stops_the_cascade() {
    let mut store = MemoryStore::new(rider());
    let mut state = loaded(&store);
    let bike = add_vehicle(&mut state, &mut store, "Tourer");
    add_fillup(&mut state, &mut store, &bike, day(1), 1_000, Some(5.0), None);
    store.fail_on(Request::DeleteFillupsForVehicle);

    assert!(state.delete_vehicle(&mut store, &bike).is_err());

    assert!(!store.requests().contains(&Request::DeleteVehicle));
    assert_eq!(store.tables().fillups.len(), 1);
    assert_eq!(state.fillups.len(), 1);
}

#[test]
fn deleting_a_fillup_restores_previous_average() {
    let mut store = MemoryStore::new(rider());
    let mut state = loaded(&store);
    let bike = add_vehicle(&mut state, &mut store, "Tourer");
    add_fillup(&mut state, &mut store, &bike, day(1), 10_000, Some(8.0), None);
    add_fillup(&mut state, &mut store, &bike, day(5), 10_320, Some(6.0), None);
    add_fillup(&mut state, &mut store, &bike, day(9), 10_560, Some(7.0), None);
    let before = state.average_mileage(&bike);

    let extra = add_fillup(&mut state, &mut store, &bike, day(12), 10_900, Some(5.0), None);
    assert_ne!(state.average_mileage(&bike), before);

    state.delete_fillup(&mut store, &extra).unwrap();
    assert_eq!(state.average_mileage(&bike), before);
    assert_eq!(before, Some(40.0));
}

#[test]
fn mileage_is_measured_within_each_vehicle() {
    let mut store = MemoryStore::new(rider());
    let mut state = loaded(&store);
    let a = add_vehicle(&mut state, &mut store, "A");
    let b = add_vehicle(&mut state, &mut store, "B");

    add_fillup(&mut state, &mut store, &a, day(1), 1_000, Some(4.0), None);
    let b1 = add_fillup(&mut state, &mut store, &b, day(2), 50_000, Some(10.0), None);
    let a2 = add_fillup(&mut state, &mut store, &a, day(3), 1_180, Some(4.0), None);

    assert_eq!(state.mileage_of(&a2), Some(45.0));
    assert_eq!(state.mileage_of(&b1), None);
    assert_eq!(state.average_mileage(&b), None);
}

#[test]
fn odometer_going_backwards_has_no_mileage() {
    let mut store = MemoryStore::new(rider());
    let mut state = loaded(&store);
    let bike = add_vehicle(&mut state, &mut store, "Tourer");
    add_fillup(&mut state, &mut store, &bike, day(1), 2_000, Some(5.0), None);
    let second = add_fillup(&mut state, &mut store, &bike, day(2), 1_900, Some(5.0), None);

    assert_eq!(state.mileage_of(&second), None);
}

#[test]
fn other_users_rows_are_invisible() {
    let mut store = MemoryStore::new(rider());
    let mut state = loaded(&store);
    add_vehicle(&mut state, &mut store, "Mine");

    let mut foreign = store.tables().motorcycles[0].clone();
    foreign.id = "someone-elses".into();
    foreign.user_id = "stranger".into();
    store.tables_mut().motorcycles.push(foreign);

    state.load(&store).unwrap();
    assert_eq!(state.vehicles.len(), 1);
    assert_eq!(state.vehicles[0].name, "Mine");
}

#[test]
fn malformed_row_fails_the_whole_load() {
    let mut store = MemoryStore::new(rider());
    let mut state = loaded(&store);
    let bike = add_vehicle(&mut state, &mut store, "Tourer");
    add_fillup(&mut state, &mut store, &bike, day(1), 1_000, Some(5.0), None);
    store.tables_mut().fillups[0].odometer = -5;

    let err = state.load(&store).unwrap_err();

    assert!(err.to_string().starts_with("Error loading data: "));
    assert!(state.vehicles.is_empty());
    assert!(state.fillups.is_empty());
}

#[test]
fn handler_drives_a_full_session() {
    let mut store = MemoryStore::new(rider());
    let mut state = AppState::new(rider(), day(31));

    assert_eq!(handle_event(&mut state, &mut store, &Event::Load), (true, vec![]));

    handle_event(&mut state, &mut store, &Event::OpenAddVehicle);
    state.vehicle_form = VehicleForm::new("Tourer", "Himalayan");
    handle_event(&mut state, &mut store, &Event::SubmitVehicle);
    let bike = state.vehicles[0].id.clone();

    handle_event(
        &mut state,
        &mut store,
        &Event::OpenAddFillup {
            vehicle_id: Some(bike.clone()),
        },
    );
    state.fillup_form.odometer = Some(8_000);
    state.fillup_form.cost = Some(450.0);
    handle_event(&mut state, &mut store, &Event::SubmitFillup);
    assert_eq!(state.fillups.len(), 1);
    assert_eq!(state.fillup_form.vehicle_id.as_deref(), Some(bike.as_str()));

    let fillup = state.fillups[0].id.clone();
    handle_event(&mut state, &mut store, &Event::EditFillup(fillup.clone()));
    if let Some(edit) = state.editing.as_mut() {
        edit.liters = 4.2;
    }
    handle_event(&mut state, &mut store, &Event::SubmitEdit);
    assert!((state.fillups[0].liters - 4.2).abs() < 1e-9);

    let (_, actions) = handle_event(
        &mut state,
        &mut store,
        &Event::RequestDelete(DeleteTarget::Fillup(fillup)),
    );
    assert_eq!(
        actions,
        vec![Action::Confirm {
            prompt: "Are you sure you want to delete this fillup record? This action cannot be undone."
                .into()
        }]
    );
    handle_event(&mut state, &mut store, &Event::ConfirmDelete);
    assert!(state.fillups.is_empty());

    let (_, actions) = handle_event(&mut state, &mut store, &Event::SignOut);
    assert_eq!(actions, vec![Action::SignedOut]);
}
