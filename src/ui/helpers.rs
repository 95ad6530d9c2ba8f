//! Formatting helpers shared by the dashboard and the exporter.

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;

/// Format used when a configured date format cannot be rendered.
const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Returns `true` if `format` is a chrono strftime string chrono can render.
///
/// ```
/// use miley::ui::helpers::is_valid_date_format;
///
/// assert!(is_valid_date_format("%-d/%-m/%Y"));
/// assert!(!is_valid_date_format("%Q"));
/// ```
#[must_use]
pub fn is_valid_date_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Formats `date` with `format`, falling back to ISO 8601 for invalid formats.
#[must_use]
pub fn format_date(date: NaiveDate, format: &str) -> String {
    if is_valid_date_format(format) {
        date.format(format).to_string()
    } else {
        tracing::warn!(format, "invalid date format, using ISO dates");
        date.format(FALLBACK_DATE_FORMAT).to_string()
    }
}

/// Formats an amount in rupees rounded half away from zero, e.g. `₹1235`.
#[must_use]
pub fn format_rupees(amount: f64) -> String {
    format!("₹{:.0}", amount.round())
}

/// Pads or truncates `text` to exactly `width` characters.
///
/// Truncated text ends with `…`. Counts characters, not bytes.
#[must_use]
pub fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return format!("{text:<width$}");
    }
    if width == 0 {
        return String::new();
    }
    let mut truncated: String = text.chars().take(width - 1).collect();
    truncated.push('…');
    truncated
}
