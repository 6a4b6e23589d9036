#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use weight_chart::{OperationType, RawEntry};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores variables on unwind and serializes access to the process-global
/// environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    utc(y, m, d, 0, 0)
}

/// A create row measured at `at`, written to the server a few seconds later.
pub fn create_at(at: DateTime<Utc>, weight_kg: f64) -> RawEntry {
    RawEntry::new(
        OperationType::Create,
        at.to_rfc3339(),
        (at + chrono::Duration::seconds(5)).to_rfc3339(),
        (weight_kg * 10.0).round() as i64,
    )
}

pub fn create_with_server(entry_ts: &str, server_ts: &str, weight_kg: f64) -> RawEntry {
    RawEntry::new(
        OperationType::Create,
        entry_ts,
        server_ts,
        (weight_kg * 10.0).round() as i64,
    )
}

pub fn delete_of(entry: &RawEntry) -> RawEntry {
    RawEntry::new(
        OperationType::Delete,
        entry.entry_timestamp.clone(),
        entry.server_timestamp.clone(),
        0,
    )
}

/// One morning reading per day for `weights.len()` consecutive days.
pub fn daily_log(start: DateTime<Utc>, weights: &[f64]) -> Vec<RawEntry> {
    weights
        .iter()
        .enumerate()
        .map(|(i, &w)| create_at(start + chrono::Duration::days(i as i64) + chrono::Duration::hours(7), w))
        .collect()
}
