//! CSV export through the event handler.

use chrono::NaiveDate;
use miley::app::{handle_event, Action, AppState, Event};
use miley::domain::{SessionUser, VehicleForm};
use miley::storage::MemoryStore;

fn rider() -> SessionUser {
    SessionUser {
        id: "rider".into(),
        email: None,
    }
}

fn record(
    state: &mut AppState,
    store: &mut MemoryStore,
    vehicle: &str,
    date: (u32, u32),
    odometer: u32,
    liters: f64,
) {
    state.fillup_form.vehicle_id = Some(vehicle.to_string());
    state.fillup_form.date = NaiveDate::from_ymd_opt(2024, date.0, date.1).unwrap();
    state.fillup_form.odometer = Some(odometer);
    state.fillup_form.liters = Some(liters);
    state.fillup_form.cost = Some(liters * 104.0);
    handle_event(state, store, &Event::SubmitFillup);
}

#[test]
fn export_produces_dated_csv_in_chronological_order() {
    let mut store = MemoryStore::new(rider());
    let mut state = AppState::new(rider(), NaiveDate::from_ymd_opt(2024, 7, 9).unwrap());
    handle_event(&mut state, &mut store, &Event::Load);

    state.vehicle_form = VehicleForm::new("Daily", "Classic 350");
    handle_event(&mut state, &mut store, &Event::SubmitVehicle);
    state.vehicle_form = VehicleForm::new("Weekend", "");
    handle_event(&mut state, &mut store, &Event::SubmitVehicle);
    let daily = state.vehicles[0].id.clone();
    let weekend = state.vehicles[1].id.clone();

    record(&mut state, &mut store, &daily, (7, 2), 12_400, 5.0);
    record(&mut state, &mut store, &weekend, (6, 30), 3_000, 8.0);
    record(&mut state, &mut store, &daily, (6, 25), 12_200, 4.0);

    let (redraw, actions) = handle_event(&mut state, &mut store, &Event::Export);
    assert!(!redraw);
    let [Action::Download(download)] = actions.as_slice() else {
        panic!("expected a single download, got {actions:?}");
    };

    assert_eq!(download.file_name, "motorcycle_mileage_2024-07-09.csv");
    assert_eq!(download.mime_type, "text/csv;charset=utf-8;");

    let expected = [
        "Date,Motorcycle,Odometer (km),Liters,Cost (INR),Mileage (km/l),Pump Name",
        "\"25/6/2024\",\"Daily (Classic 350)\",12200,4.00,416.00,N/A,\"Not specified\"",
        "\"30/6/2024\",\"Weekend (Unknown)\",3000,8.00,832.00,N/A,\"Not specified\"",
        "\"2/7/2024\",\"Daily (Classic 350)\",12400,5.00,520.00,50.00,\"Not specified\"",
    ]
    .join("\n");
    assert_eq!(download.contents, expected);
}

#[test]
fn export_honours_configured_date_format() {
    let mut store = MemoryStore::new(rider());
    let mut state = AppState::new(rider(), NaiveDate::from_ymd_opt(2024, 7, 9).unwrap())
        .with_date_format("%Y-%m-%d");
    handle_event(&mut state, &mut store, &Event::Load);
    state.vehicle_form = VehicleForm::new("Daily", "Classic 350");
    handle_event(&mut state, &mut store, &Event::SubmitVehicle);
    let daily = state.vehicles[0].id.clone();
    record(&mut state, &mut store, &daily, (7, 2), 12_400, 5.0);

    let (_, actions) = handle_event(&mut state, &mut store, &Event::Export);
    let Some(Action::Download(download)) = actions.first() else {
        panic!("expected a download");
    };
    assert!(download.contents.contains("\n\"2024-07-02\","));
}

#[test]
fn empty_log_exports_nothing() {
    let mut store = MemoryStore::new(rider());
    let mut state = AppState::new(rider(), NaiveDate::from_ymd_opt(2024, 7, 9).unwrap());
    handle_event(&mut state, &mut store, &Event::Load);

    let (_, actions) = handle_event(&mut state, &mut store, &Event::Export);
    assert_eq!(actions, vec![Action::Alert("No data to export!".into())]);
}
