//! Deterministic sample entry logs.
//!
//! Used by the benchmark, the integration tests and `chart-report --sample`.
//! The same arguments always produce the same log.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::f64::consts::PI;

use crate::models::{OperationType, RawEntry};

/// Knobs for [`generate_history_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleOptions {
    /// Every `n`-th day gets an extra implausible reading (0 disables).
    pub outlier_every: usize,
    /// Every `n`-th day is created and then deleted (0 disables).
    pub delete_every: usize,
    /// Every `n`-th day gets a malformed entry timestamp (0 disables).
    pub malformed_every: usize,
}

impl SampleOptions {
    /// A noisy log exercising every reduction and filtering path.
    pub fn noisy() -> Self {
        Self {
            outlier_every: 37,
            delete_every: 11,
            malformed_every: 97,
        }
    }
}

/// A clean daily log of `days` entries ending on `end`, drifting linearly
/// from `start_weight` by -1 kg per 100 days with a small weekly wobble.
pub fn generate_history(days: usize, start_weight: f64, end: DateTime<Utc>) -> Vec<RawEntry> {
    generate_history_with(days, start_weight, end, &SampleOptions::default())
}

pub fn generate_history_with(
    days: usize,
    start_weight: f64,
    end: DateTime<Utc>,
    options: &SampleOptions,
) -> Vec<RawEntry> {
    let mut log = Vec::with_capacity(days + days / 8);
    let start = end - Duration::days(days as i64 - 1);

    for day in 0..days {
        let measured_at = start + Duration::days(day as i64) + Duration::minutes(7 * 60 + 15);
        let written_at = measured_at + Duration::seconds(4);
        let wobble = 0.4 * (2.0 * PI * day as f64 / 7.0).sin();
        let weight = start_weight - day as f64 / 100.0 + wobble;

        let entry_ts = if hits(options.malformed_every, day) {
            format!("day-{day}")
        } else {
            rfc3339(measured_at)
        };

        log.push(
            RawEntry::new(
                OperationType::Create,
                entry_ts.clone(),
                rfc3339(written_at),
                fixed_point(weight),
            )
            .with_bmi(fixed_point(weight / 3.1)),
        );

        if hits(options.delete_every, day) {
            log.push(RawEntry::new(
                OperationType::Delete,
                entry_ts,
                rfc3339(written_at + Duration::hours(1)),
                0,
            ));
        }

        if hits(options.outlier_every, day) {
            // Separate key, earlier the same day.
            let spike_at = measured_at - Duration::hours(3);
            log.push(RawEntry::new(
                OperationType::Create,
                rfc3339(spike_at),
                rfc3339(spike_at + Duration::seconds(4)),
                fixed_point(weight * 3.0),
            ));
        }
    }
    log
}

fn hits(every: usize, day: usize) -> bool {
    every > 0 && day > 0 && day % every == 0
}

fn fixed_point(value: f64) -> i64 {
    (value * 10.0).round() as i64
}

fn rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_clean_history_is_deterministic() {
        let a = generate_history(30, 80.0, end());
        let b = generate_history(30, 80.0, end());
        assert_eq!(a, b);
        assert_eq!(a.len(), 30);
        assert_eq!(a.last().unwrap().entry_timestamp, "2024-12-31T07:15:00Z");
        assert_eq!(a[0].weight, 800);
    }

    #[test]
    fn test_noisy_history_counts() {
        let log = generate_history_with(100, 80.0, end(), &SampleOptions::noisy());
        let deletes = log.iter().filter(|e| e.operation_type.is_delete()).count();
        // days 11, 22, ..., 99
        assert_eq!(deletes, 9);
        // days 37, 74 add one spike each
        assert_eq!(log.len(), 100 + 9 + 2);
        assert!(log.iter().any(|e| e.entry_timestamp == "day-97"));
    }
}
