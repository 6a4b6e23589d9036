//! Display strings for chart sections.

use chrono::{DateTime, Datelike, FixedOffset, Utc};

use crate::models::{ChartPoint, WeightUnit};

/// Two-letter weekday labels, indexed 1–7 with Sunday = 1.
const WEEKDAY_LABELS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// Single-letter month labels for compact axes.
const MONTH_LABELS: [&str; 12] = ["J", "F", "M", "A", "M", "J", "J", "A", "S", "O", "N", "D"];

/// Shown when there is no point to describe.
pub const PLACEHOLDER_WEIGHT: &str = "-- kg";

/// Weekday label for a 1-based index (Sunday = 1). Out-of-range yields "".
pub fn weekday_label(index: u32) -> &'static str {
    index
        .checked_sub(1)
        .and_then(|i| WEEKDAY_LABELS.get(i as usize))
        .copied()
        .unwrap_or("")
}

/// Month label for a 1-based month number. Out-of-range yields "".
pub fn month_label(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_LABELS.get(i as usize))
        .copied()
        .unwrap_or("")
}

/// Two-letter weekday of `date` in the calendar offset.
pub fn format_weekday(date: DateTime<Utc>, offset: FixedOffset) -> &'static str {
    let local = date.with_timezone(&offset);
    weekday_label(local.weekday().number_from_sunday())
}

/// Single-letter month of `date` in the calendar offset.
pub fn format_month_letter(date: DateTime<Utc>, offset: FixedOffset) -> &'static str {
    month_label(date.with_timezone(&offset).month())
}

/// `"70.5 kg"`.
pub fn format_weight(weight: f64, unit: &WeightUnit) -> String {
    format!("{:.1} {}", weight, unit)
}

/// Weight string for an optional point, falling back to the placeholder.
pub fn weight_display(point: Option<&ChartPoint>) -> String {
    match point {
        Some(p) => format_weight(p.weight, &p.unit()),
        None => PLACEHOLDER_WEIGHT.to_string(),
    }
}

/// BMI from its fixed-point (×10) representation.
pub fn format_bmi(raw: Option<i64>) -> Option<String> {
    raw.map(|bmi| format!("{:.1}", bmi as f64 / 10.0))
}
