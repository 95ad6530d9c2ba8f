//! CSV rendering of every fillup, annotated with its mileage.
//!
//! Rows are ordered by date across all vehicles, but each row's mileage is computed
//! against the previous fillup of the same vehicle. Text fields are always quoted;
//! numeric fields never are.

use crate::domain::mileage;
use crate::domain::vehicle::UNKNOWN_LABEL;
use crate::domain::{Fillup, Vehicle};
use crate::ui::helpers::format_date;
use chrono::NaiveDate;

/// Column headings, in output order.
pub const HEADER: [&str; 7] = [
    "Date",
    "Motorcycle",
    "Odometer (km)",
    "Liters",
    "Cost (INR)",
    "Mileage (km/l)",
    "Pump Name",
];

/// Media type of the exported file.
pub const MIME_TYPE: &str = "text/csv;charset=utf-8;";

/// A generated file offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub mime_type: &'static str,
    pub contents: String,
}

/// Name of the export file for `today`, e.g. `motorcycle_mileage_2024-03-05.csv`.
#[must_use]
pub fn file_name(today: NaiveDate) -> String {
    format!("motorcycle_mileage_{}.csv", today.format("%Y-%m-%d"))
}

/// Builds the export file, or returns `None` when there is nothing to export.
///
/// `date_format` is a chrono format string applied to each fillup's date.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use miley::export::export_fillups;
///
/// let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// assert!(export_fillups(&[], &[], today, "%-d/%-m/%Y").is_none());
/// ```
#[must_use]
pub fn export_fillups(
    vehicles: &[Vehicle],
    fillups: &[Fillup],
    today: NaiveDate,
    date_format: &str,
) -> Option<Download> {
    if fillups.is_empty() {
        tracing::debug!("no fillups to export");
        return None;
    }

    let contents = render(vehicles, fillups, date_format);
    let download = Download {
        file_name: file_name(today),
        mime_type: MIME_TYPE,
        contents,
    };

    tracing::debug!(
        file_name = %download.file_name,
        rows = fillups.len(),
        bytes = download.contents.len(),
        "export generated"
    );
    Some(download)
}

/// Renders the header and one line per fillup, joined with `\n`.
#[must_use]
pub fn render(vehicles: &[Vehicle], fillups: &[Fillup], date_format: &str) -> String {
    let mut sorted: Vec<&Fillup> = fillups.iter().collect();
    sorted.sort_by_key(|f| f.date);
    let mileages = mileage::mileage_by_fillup(fillups);

    let mut lines = Vec::with_capacity(sorted.len() + 1);
    lines.push(HEADER.join(","));
    lines.extend(sorted.into_iter().map(|fillup| {
        let mileage = mileages.get(fillup.id.as_str()).copied().flatten();
        render_row(vehicles, fillup, mileage, date_format)
    }));
    lines.join("\n")
}

fn render_row(
    vehicles: &[Vehicle],
    fillup: &Fillup,
    mileage: Option<f64>,
    date_format: &str,
) -> String {
    let vehicle = vehicles.iter().find(|v| v.id == fillup.vehicle_id);
    let name = vehicle
        .map(|v| v.name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(UNKNOWN_LABEL);
    let model = vehicle
        .and_then(|v| v.model.as_deref())
        .filter(|m| !m.is_empty())
        .unwrap_or(UNKNOWN_LABEL);

    let fields = [
        quoted(&format_date(fillup.date, date_format)),
        quoted(&format!("{name} ({model})")),
        fillup.odometer.to_string(),
        format!("{:.2}", fillup.liters),
        format!("{:.2}", fillup.cost),
        mileage::display(mileage),
        quoted(fillup.pump_label()),
    ];
    fields.join(",")
}

/// Wraps a text field in double quotes, doubling any embedded quote.
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
