//! Bucketing of valid entries into daily or monthly chart points.
//!
//! Buckets are calendar days or months in the configured fixed offset.
//! Entries whose timestamp cannot be parsed are kept and spread over the
//! trailing fallback window instead of being dropped.

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{ChartConfig, MAX_SPAN_DAYS};
use crate::models::{ChartPoint, OperationType, RawEntry};
use crate::services::timestamp::parse_timestamp;

/// Bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationMode {
    /// One point per calendar day, last write (by server timestamp) wins.
    Daily,
    /// One averaged point per calendar month.
    Monthly,
}

/// An entry with its resolved instant.
#[derive(Debug, Clone)]
pub struct DatedEntry {
    pub date: DateTime<Utc>,
    pub server_time: Option<DateTime<Utc>>,
    pub entry: Arc<RawEntry>,
    /// True when `date` was synthesized because the timestamp did not parse.
    pub fallback: bool,
}

/// Resolve every entry's instant, fallback-dating the ones that fail.
///
/// The `n` failures, in input order, get
/// `now - W + W·(i+1)/(n+1)` with `W = window_days`, so they land strictly
/// inside the trailing window and keep their relative order.
pub fn resolve_dates(entries: &[RawEntry], now: DateTime<Utc>, window_days: i64) -> Vec<DatedEntry> {
    let mut dated: Vec<DatedEntry> = Vec::with_capacity(entries.len());
    let mut failed: Vec<usize> = Vec::new();

    for entry in entries {
        let parsed = parse_timestamp(&entry.entry_timestamp);
        if parsed.is_none() {
            failed.push(dated.len());
        }
        dated.push(DatedEntry {
            date: parsed.unwrap_or(now),
            server_time: parse_timestamp(&entry.server_timestamp),
            entry: Arc::new(entry.clone()),
            fallback: parsed.is_none(),
        });
    }

    if !failed.is_empty() {
        let span_secs = window_days.clamp(1, MAX_SPAN_DAYS) * 86_400;
        let slots = failed.len() as i64 + 1;
        let window_start = now - Duration::seconds(span_secs);
        for (i, &idx) in failed.iter().enumerate() {
            let offset = span_secs * (i as i64 + 1) / slots;
            dated[idx].date = window_start + Duration::seconds(offset);
        }
        log::warn!(
            "{} entries had unparseable timestamps; assigned fallback dates within the last {} days",
            failed.len(),
            window_days
        );
    }

    dated
}

/// Aggregate valid entries into ascending chart points.
pub fn aggregate(
    entries: &[RawEntry],
    mode: AggregationMode,
    config: &ChartConfig,
    now: DateTime<Utc>,
) -> Vec<ChartPoint> {
    let dated = resolve_dates(entries, now, config.fallback_window_days);
    let offset = config.calendar_offset();
    match mode {
        AggregationMode::Daily => aggregate_daily(dated, offset, now),
        AggregationMode::Monthly => aggregate_monthly(dated, offset),
    }
}

/// Keep the latest-written entry per calendar day.
///
/// Unparseable server timestamps count as oldest; equal ones keep the entry
/// that appears later in input order. Fallback-dated entries take no part in
/// that contest: each one is placed on the free day closest to its assigned
/// date, never after `now`, so none of them is lost to a same-day reading.
pub fn aggregate_daily(
    dated: Vec<DatedEntry>,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Vec<ChartPoint> {
    let (fallbacks, measured): (Vec<DatedEntry>, Vec<DatedEntry>) =
        dated.into_iter().partition(|d| d.fallback);

    let mut days: BTreeMap<NaiveDate, DatedEntry> = BTreeMap::new();
    for item in measured {
        let day = item.date.with_timezone(&offset).date_naive();
        match days.get(&day) {
            Some(current) if item.server_time < current.server_time => {}
            _ => {
                days.insert(day, item);
            }
        }
    }

    let today = now.with_timezone(&offset).date_naive();
    let mut moved = 0usize;
    for item in fallbacks {
        let assigned = item.date.with_timezone(&offset).date_naive();
        let day = nearest_free_day(&days, assigned, today);
        if day != assigned {
            moved += 1;
        }
        days.insert(day, item);
    }
    if moved > 0 {
        log::debug!("{} fallback-dated entries moved to the nearest free day", moved);
    }

    days.into_iter()
        .map(|(day, item)| {
            ChartPoint::new(
                local_midnight_utc(day, offset),
                item.entry.weight_value(),
                item.entry,
            )
        })
        .collect()
}

/// Closest day to `assigned` with no point yet, alternating later and
/// earlier candidates; later candidates stop at `latest`.
fn nearest_free_day(
    days: &BTreeMap<NaiveDate, DatedEntry>,
    assigned: NaiveDate,
    latest: NaiveDate,
) -> NaiveDate {
    let is_free = |day: &NaiveDate| !days.contains_key(day);
    if is_free(&assigned) {
        return assigned;
    }
    // Among `len + 1` consecutive earlier days at least one is free.
    for step in 1..=days.len() as u64 + 1 {
        let later = assigned
            .checked_add_days(Days::new(step))
            .filter(|day| *day <= latest && is_free(day));
        let earlier = assigned
            .checked_sub_days(Days::new(step))
            .filter(|day| is_free(day));
        if let Some(day) = later.or(earlier) {
            return day;
        }
    }
    assigned
}

/// Average weights per calendar month into one synthetic point dated at the
/// first of the month. Members logged in another unit are converted to the
/// first member's unit before averaging.
pub fn aggregate_monthly(mut dated: Vec<DatedEntry>, offset: FixedOffset) -> Vec<ChartPoint> {
    dated.sort_by_key(|d| d.date);

    let mut months: BTreeMap<(i32, u32), Vec<DatedEntry>> = BTreeMap::new();
    for item in dated {
        let local = item.date.with_timezone(&offset);
        months
            .entry((local.year(), local.month()))
            .or_default()
            .push(item);
    }

    months
        .into_iter()
        .filter_map(|((year, month), members)| {
            let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
            let date = local_midnight_utc(first_day, offset);
            let unit_factor = members.first()?.entry.weight_unit().kg_factor();
            let mean = members
                .iter()
                .map(|m| m.entry.weight_value() * m.entry.weight_unit().kg_factor() / unit_factor)
                .sum::<f64>()
                / members.len() as f64;
            let source = month_representative(&members, date, mean)?;
            Some(ChartPoint::new(date, mean, Arc::new(source)))
        })
        .collect()
}

/// Synthetic entry standing in for a month: first member's unit, first
/// non-null BMI, the mean weight in fixed point.
fn month_representative(members: &[DatedEntry], date: DateTime<Utc>, mean: f64) -> Option<RawEntry> {
    let first = members.first()?;
    let mut representative = RawEntry::new(
        OperationType::Create,
        date.to_rfc3339(),
        first.entry.server_timestamp.clone(),
        (mean * 10.0).round() as i64,
    );
    representative.unit = first.entry.unit.clone();
    representative.bmi = members.iter().find_map(|m| m.entry.bmi);
    Some(representative)
}

/// Local midnight of `day` in `offset`, as a UTC instant.
pub fn local_midnight_utc(day: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = day.and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&(local - Duration::seconds(i64::from(offset.local_minus_utc()))))
}
