//! Plain-text rendering of the dashboard.
//!
//! Output is written to any [`Write`] so the CLI can print to stdout and tests can
//! render into a buffer.

use crate::app::AppState;
use crate::ui::helpers::fit;
use crate::ui::viewmodel::{DashboardViewModel, EmptyState, QuickStats, VehicleCard};
use std::io::{self, Write};

const DATE_WIDTH: usize = 11;
const ODOMETER_WIDTH: usize = 10;
const LITERS_WIDTH: usize = 8;
const COST_WIDTH: usize = 9;
const MILEAGE_WIDTH: usize = 10;
const PUMP_WIDTH: usize = 20;

/// Renders the dashboard for `state` into `out`.
///
/// # Errors
///
/// Returns any error raised by `out`.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use miley::app::AppState;
/// use miley::domain::SessionUser;
///
/// let user = SessionUser { id: "u1".into(), email: None };
/// let state = AppState::new(user, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
///
/// let mut out = Vec::new();
/// miley::ui::render(&state, &mut out).unwrap();
/// assert!(String::from_utf8(out).unwrap().contains("No vehicles yet"));
/// ```
pub fn render(state: &AppState, out: &mut dyn Write) -> io::Result<()> {
    let viewmodel = state.compute_viewmodel();
    render_viewmodel(&viewmodel, out)
}

/// Renders a pre-computed view model.
///
/// # Errors
///
/// Returns any error raised by `out`.
pub fn render_viewmodel(vm: &DashboardViewModel, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", vm.header.title)?;
    if let Some(greeting) = &vm.header.greeting {
        writeln!(out, "{greeting}")?;
    }
    writeln!(out)?;
    render_stats(&vm.stats, out)?;

    if let Some(empty) = &vm.empty_state {
        return render_empty_state(empty, out);
    }

    for card in &vm.cards {
        writeln!(out)?;
        render_card(card, out)?;
    }
    Ok(())
}

fn render_stats(stats: &QuickStats, out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "Motorcycles: {}  Fillups: {}  Total spent: {}",
        stats.vehicles, stats.fillups, stats.total_spent
    )
}

fn render_empty_state(empty: &EmptyState, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", empty.message)?;
    writeln!(out, "{}", empty.hint)
}

/// Renders one vehicle's summary followed by its fillup table.
///
/// # Errors
///
/// Returns any error raised by `out`.
pub fn render_card(card: &VehicleCard, out: &mut dyn Write) -> io::Result<()> {
    let plural = if card.fillup_count == 1 { "" } else { "s" };
    writeln!(out, "{}  [{}]", card.title, card.id)?;
    match &card.average {
        Some(average) => writeln!(
            out,
            "  {} fillup{plural}, average {average} km/l",
            card.fillup_count
        )?,
        None => writeln!(out, "  {} fillup{plural}", card.fillup_count)?,
    }

    if let Some(message) = &card.empty_message {
        return writeln!(out, "  {message}");
    }

    writeln!(
        out,
        "  {} {} {} {} {} {} ID",
        fit("Date", DATE_WIDTH),
        fit("Odometer", ODOMETER_WIDTH),
        fit("Liters", LITERS_WIDTH),
        fit("Cost", COST_WIDTH),
        fit("km/l", MILEAGE_WIDTH),
        fit("Pump", PUMP_WIDTH),
    )?;
    for line in &card.lines {
        writeln!(
            out,
            "  {} {} {} {} {} {} {}",
            fit(&line.date, DATE_WIDTH),
            fit(&line.odometer.to_string(), ODOMETER_WIDTH),
            fit(&line.liters, LITERS_WIDTH),
            fit(&line.cost, COST_WIDTH),
            fit(&line.mileage, MILEAGE_WIDTH),
            fit(&line.pump, PUMP_WIDTH),
            line.id,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::viewmodel::{FillupLine, HeaderInfo};

    fn render_to_string(vm: &DashboardViewModel) -> String {
        let mut out = Vec::new();
        render_viewmodel(vm, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn viewmodel(cards: Vec<VehicleCard>) -> DashboardViewModel {
        DashboardViewModel {
            header: HeaderInfo {
                title: "Motorcycle Mileage Tracker".into(),
                greeting: Some("Welcome, rider@example.com".into()),
            },
            stats: QuickStats {
                vehicles: cards.len(),
                fillups: 1,
                total_spent: "₹500".into(),
            },
            cards,
            empty_state: None,
            can_add_fillup: true,
        }
    }

    #[test]
    fn renders_card_with_fillup_rows() {
        let card = VehicleCard {
            id: "b1".into(),
            title: "Daily (Pulsar)".into(),
            fillup_count: 1,
            average: None,
            lines: vec![FillupLine {
                id: "f1".into(),
                date: "5/3/2024".into(),
                odometer: 15_000,
                liters: "5.00".into(),
                cost: "500.00".into(),
                mileage: "N/A".into(),
                pump: "Not specified".into(),
            }],
            empty_message: None,
        };

        let text = render_to_string(&viewmodel(vec![card]));

        assert!(text.starts_with("Motorcycle Mileage Tracker\nWelcome, rider@example.com\n"));
        assert!(text.contains("Total spent: ₹500"));
        assert!(text.contains("Daily (Pulsar)  [b1]\n  1 fillup\n"));
        assert!(text.contains("15000"));
        assert!(text.contains("Not specified"));
    }

    #[test]
    fn renders_empty_card_message() {
        let card = VehicleCard {
            id: "b1".into(),
            title: "Daily ()".into(),
            fillup_count: 0,
            average: None,
            lines: vec![],
            empty_message: Some("No fillups recorded for this vehicle".into()),
        };

        let text = render_to_string(&viewmodel(vec![card]));

        assert!(text.contains("  0 fillups\n  No fillups recorded for this vehicle\n"));
        assert!(!text.contains("Odometer"));
    }
}
