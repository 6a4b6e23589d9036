//! Removal of implausible weight samples from a chronological point series.
//!
//! Three passes run in order on kilogram-equivalent weights:
//! 1. absolute plausibility bounds,
//! 2. interquartile-range fences over what survived pass 1,
//! 3. a consecutive-jump check against the last *kept* point.

use chrono::Duration;

use crate::config::OutlierSettings;
use crate::models::ChartPoint;

/// Number of points each pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutlierReport {
    pub out_of_bounds: usize,
    pub outside_iqr: usize,
    pub jumps: usize,
    pub exempt: usize,
}

impl OutlierReport {
    pub fn removed(&self) -> usize {
        self.out_of_bounds + self.outside_iqr + self.jumps
    }
}

/// Filter `points` (ascending by date), preserving order.
///
/// Inputs shorter than `settings.min_points` are returned unchanged.
pub fn filter_outliers(points: &[ChartPoint], settings: &OutlierSettings) -> Vec<ChartPoint> {
    filter_outliers_with_report(points, settings).0
}

pub fn filter_outliers_with_report(
    points: &[ChartPoint],
    settings: &OutlierSettings,
) -> (Vec<ChartPoint>, OutlierReport) {
    let mut report = OutlierReport::default();
    if points.len() < settings.min_points {
        return (points.to_vec(), report);
    }

    let in_bounds: Vec<&ChartPoint> = points
        .iter()
        .filter(|p| {
            let kg = p.weight_kg();
            kg >= settings.min_weight && kg <= settings.max_weight
        })
        .collect();
    report.out_of_bounds = points.len() - in_bounds.len();

    let (lower, upper) = match iqr_fences(&in_bounds, settings.iqr_multiplier) {
        Some(fences) => fences,
        None => return (Vec::new(), report),
    };
    let in_fences: Vec<&ChartPoint> = in_bounds
        .iter()
        .copied()
        .filter(|p| {
            let kg = p.weight_kg();
            kg >= lower && kg <= upper
        })
        .collect();
    report.outside_iqr = in_bounds.len() - in_fences.len();

    let mut kept: Vec<ChartPoint> = Vec::with_capacity(in_fences.len());
    let mut baseline: Option<f64> = None;
    for point in in_fences {
        let kg = point.weight_kg();
        if let Some(previous) = baseline {
            if previous > 0.0 && (kg - previous).abs() / previous > settings.max_jump_ratio {
                report.jumps += 1;
                continue;
            }
        }
        baseline = Some(kg);
        kept.push(point.clone());
    }

    if report.removed() > 0 {
        log::debug!(
            "Outlier filter removed {} of {} points (bounds={}, iqr={}, jumps={})",
            report.removed(),
            points.len(),
            report.out_of_bounds,
            report.outside_iqr,
            report.jumps
        );
    }
    (kept, report)
}

/// Index-based quartile fences `[Q1 - k·IQR, Q3 + k·IQR]`.
fn iqr_fences(points: &[&ChartPoint], multiplier: f64) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = points.iter().map(|p| p.weight_kg()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let count = sorted.len();
    let q1 = sorted[count / 4];
    let q3 = sorted[count * 3 / 4];
    let iqr = q3 - q1;
    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

/// Filter everything except the trailing `exempt_days` window, which is
/// merged back untouched. `exempt_days == 0` filters the whole series.
pub fn filter_with_recent_exemption(
    points: &[ChartPoint],
    settings: &OutlierSettings,
    exempt_days: i64,
) -> (Vec<ChartPoint>, OutlierReport) {
    let Some(last) = points.last() else {
        return (Vec::new(), OutlierReport::default());
    };
    if exempt_days <= 0 {
        return filter_outliers_with_report(points, settings);
    }

    let Some(cutoff) = Duration::try_days(exempt_days).and_then(|d| last.date.checked_sub_signed(d))
    else {
        let report = OutlierReport {
            exempt: points.len(),
            ..OutlierReport::default()
        };
        return (points.to_vec(), report);
    };
    let split = points.partition_point(|p| p.date <= cutoff);
    let (older, recent) = points.split_at(split);

    let (mut kept, mut report) = filter_outliers_with_report(older, settings);
    report.exempt = recent.len();
    kept.extend_from_slice(recent);
    (kept, report)
}
