//! Sorted point storage with windowed, nearest-point and interpolation
//! queries. All lookups are binary searches over the date-ordered points.

use chrono::{DateTime, Duration, Utc};

use crate::models::ChartPoint;

/// Ascending-by-date point sequence.
#[derive(Debug, Clone, Default)]
pub struct PointStore {
    points: Vec<ChartPoint>,
}

impl PointStore {
    /// Build a store, sorting `points` by date (stable).
    pub fn new(mut points: Vec<ChartPoint>) -> Self {
        if !points.windows(2).all(|w| w[0].date <= w[1].date) {
            points.sort_by_key(|p| p.date);
        }
        Self { points }
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ChartPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ChartPoint> {
        self.points.last()
    }

    /// Points with `start <= date <= end`.
    pub fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[ChartPoint] {
        if start > end {
            return &[];
        }
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end);
        &self.points[lo..hi]
    }

    /// Points to render for a viewport centred on `center`.
    ///
    /// The viewport spans `window` and is widened by `padding` on both sides.
    /// Stores smaller than `threshold` return every point. A viewport
    /// reaching past the representable range is clamped to it.
    pub fn visible(
        &self,
        center: DateTime<Utc>,
        window: Duration,
        padding: Duration,
        threshold: usize,
    ) -> &[ChartPoint] {
        if self.points.len() < threshold {
            return &self.points;
        }
        let Some(reach) = (window / 2).checked_add(&padding) else {
            return &self.points;
        };
        let start = center
            .checked_sub_signed(reach)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = center
            .checked_add_signed(reach)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.range(start, end)
    }

    /// Point closest to `date`; the earlier point wins an exact tie.
    pub fn nearest(&self, date: DateTime<Utc>) -> Option<&ChartPoint> {
        let idx = self.points.partition_point(|p| p.date < date);
        let after = self.points.get(idx);
        let before = idx.checked_sub(1).and_then(|i| self.points.get(i));
        match (before, after) {
            (Some(b), Some(a)) => {
                if date - b.date <= a.date - date {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(b), None) => Some(b),
            (None, a) => a,
        }
    }

    /// Point whose date equals `date` exactly.
    pub fn exact(&self, date: DateTime<Utc>) -> Option<&ChartPoint> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| &self.points[i])
    }

    /// Weight at `date`, linearly interpolated between neighbours and
    /// clamped to the end values outside the covered range.
    pub fn interpolate(&self, date: DateTime<Utc>) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        if date <= first.date {
            return Some(first.weight);
        }
        if date >= last.date {
            return Some(last.weight);
        }

        // first.date < date < last.date, so 1 <= idx < len
        let idx = self.points.partition_point(|p| p.date < date);
        let next = &self.points[idx];
        if next.date == date {
            return Some(next.weight);
        }
        let prev = &self.points[idx - 1];

        let span = (next.date - prev.date).num_milliseconds() as f64;
        if span <= 0.0 {
            return Some(prev.weight);
        }
        let ratio = ((date - prev.date).num_milliseconds() as f64 / span).clamp(0.0, 1.0);
        Some(prev.weight + ratio * (next.weight - prev.weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OperationType, RawEntry};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn store(days_and_weights: &[(u32, f64)]) -> PointStore {
        PointStore::new(
            days_and_weights
                .iter()
                .map(|&(d, w)| {
                    let entry = RawEntry::new(OperationType::Create, d.to_string(), "", (w * 10.0) as i64);
                    ChartPoint::new(day(d), w, Arc::new(entry))
                })
                .collect(),
        )
    }

    #[test]
    fn test_new_sorts_points() {
        let s = store(&[(5, 71.0), (1, 70.0), (3, 72.0)]);
        let dates: Vec<_> = s.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(3), day(5)]);
    }

    #[test]
    fn test_range_inclusive() {
        let s = store(&[(1, 70.0), (3, 71.0), (5, 72.0), (7, 73.0)]);
        assert_eq!(s.range(day(3), day(5)).len(), 2);
        assert_eq!(s.range(day(2), day(6)).len(), 2);
        assert!(s.range(day(8), day(9)).is_empty());
        assert!(s.range(day(5), day(3)).is_empty());
    }

    #[test]
    fn test_visible_below_threshold_returns_all() {
        let s = store(&[(1, 70.0), (20, 71.0)]);
        let v = s.visible(day(1), Duration::days(2), Duration::days(0), 50);
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_visible_applies_padding() {
        let s = store(&[(1, 70.0), (5, 70.0), (10, 70.0), (15, 70.0), (20, 70.0), (25, 70.0)]);
        let tight = s.visible(day(15), Duration::days(2), Duration::days(0), 0);
        assert_eq!(tight.len(), 1);
        let padded = s.visible(day(15), Duration::days(2), Duration::days(5), 0);
        let dates: Vec<_> = padded.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(10), day(15), day(20)]);
    }

    #[test]
    fn test_visible_clamps_at_representable_range() {
        let s = store(&[(1, 70.0), (5, 70.0), (10, 70.0)]);
        let week = Duration::days(7);
        assert!(s.visible(DateTime::<Utc>::MIN_UTC, week, Duration::days(3), 0).is_empty());
        assert!(s.visible(DateTime::<Utc>::MAX_UTC, week, Duration::days(3), 0).is_empty());
        assert_eq!(s.visible(day(5), Duration::MAX, Duration::MAX, 0).len(), 3);
    }

    #[test]
    fn test_nearest() {
        let s = store(&[(1, 70.0), (5, 71.0), (9, 72.0)]);
        assert_eq!(s.nearest(day(2)).unwrap().date, day(1));
        assert_eq!(s.nearest(day(4)).unwrap().date, day(5));
        assert_eq!(s.nearest(day(3)).unwrap().date, day(1));
        assert_eq!(s.nearest(day(20)).unwrap().date, day(9));
        assert_eq!(s.nearest(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()).unwrap().date, day(1));
        assert!(PointStore::default().nearest(day(1)).is_none());
    }

    #[test]
    fn test_exact() {
        let s = store(&[(1, 70.0), (5, 71.0)]);
        assert_eq!(s.exact(day(5)).unwrap().weight, 71.0);
        assert!(s.exact(day(4)).is_none());
    }

    #[test]
    fn test_interpolate() {
        let s = store(&[(1, 70.0), (5, 74.0), (9, 72.0)]);
        assert_eq!(s.interpolate(day(3)), Some(72.0));
        assert_eq!(s.interpolate(day(5)), Some(74.0));
        assert_eq!(s.interpolate(day(7)), Some(73.0));
    }

    #[test]
    fn test_interpolate_clamps_to_ends() {
        let s = store(&[(10, 70.0), (20, 80.0)]);
        assert_eq!(s.interpolate(day(1)), Some(70.0));
        assert_eq!(s.interpolate(day(31)), Some(80.0));
        assert_eq!(PointStore::default().interpolate(day(1)), None);
    }
}
