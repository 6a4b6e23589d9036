use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;

use super::format;
use super::SectionKind;
use crate::config::{ChartConfig, SectionPolicy};
use crate::models::{ChartPoint, RawEntry, WeightRange};
use crate::services::{
    aggregate, filter_with_recent_exemption, reduce_operations, OutlierReport, PointStore,
};

/// Selection state of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionState {
    Idle,
    Selected,
}

/// Points computed for one section, ready to be applied.
///
/// Building this is the expensive part of a rebuild and touches no section
/// state, so it can run away from the interactive path.
#[derive(Debug, Clone)]
pub struct SectionData {
    pub kind: SectionKind,
    pub points: Vec<ChartPoint>,
    pub outliers: OutlierReport,
}

impl SectionData {
    /// Aggregate already-reduced entries and filter outliers for `kind`.
    pub fn compute(
        kind: SectionKind,
        valid_entries: &[RawEntry],
        config: &ChartConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let bucketed = aggregate(valid_entries, kind.aggregation_mode(), config, now);
        let policy = config.policy(kind);
        let (points, outliers) =
            filter_with_recent_exemption(&bucketed, &config.outliers, policy.recent_exempt_days);
        log::debug!(
            "Built {} section: {} buckets, {} points after filtering",
            kind,
            bucketed.len(),
            points.len()
        );
        Self {
            kind,
            points,
            outliers,
        }
    }
}

/// Headline numbers for a section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub kind: SectionKind,
    pub point_count: usize,
    pub first_weight: Option<f64>,
    pub last_weight: Option<f64>,
    /// `last - first`.
    pub change: Option<f64>,
    pub mean_weight: Option<f64>,
}

/// Serializable view of a section for external renderers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSnapshot {
    pub summary: SectionSummary,
    pub state: SelectionState,
    pub weight_range: Option<WeightRange>,
    pub selected_date: Option<String>,
    pub scroll_position: Option<DateTime<Utc>>,
    pub weight_display_value: String,
    pub weight_display_label: &'static str,
    pub bmi: Option<String>,
    pub visible_points: Vec<ChartPoint>,
}

/// Owns one section's points, selection and scroll position.
///
/// Calls must be serialized by the owner; a rebuild replaces all state.
#[derive(Debug, Clone)]
pub struct SectionController {
    kind: SectionKind,
    config: ChartConfig,
    policy: SectionPolicy,
    offset: FixedOffset,
    store: PointStore,
    selected: Option<ChartPoint>,
    scroll_position: Option<DateTime<Utc>>,
    weight_range: Option<WeightRange>,
    last_outliers: OutlierReport,
}

impl SectionController {
    pub fn new(kind: SectionKind, config: &ChartConfig) -> Self {
        Self {
            kind,
            config: config.clone(),
            policy: config.policy(kind),
            offset: config.calendar_offset(),
            store: PointStore::default(),
            selected: None,
            scroll_position: None,
            weight_range: None,
            last_outliers: OutlierReport::default(),
        }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn policy(&self) -> SectionPolicy {
        self.policy
    }

    /// Rebuild from a raw operation log.
    pub fn process_entries(&mut self, entries: &[RawEntry], now: DateTime<Utc>) {
        let valid = reduce_operations(entries);
        let data = SectionData::compute(self.kind, &valid, &self.config, now);
        self.apply(data);
    }

    /// Replace all state with freshly computed points.
    ///
    /// The latest point becomes selected and the viewport centres on it.
    pub fn apply(&mut self, data: SectionData) {
        debug_assert_eq!(data.kind, self.kind);
        self.store = PointStore::new(data.points);
        self.weight_range = WeightRange::from_points(self.store.points());
        self.selected = self.store.last().cloned();
        self.scroll_position = self.selected.as_ref().map(|p| p.date);
        self.last_outliers = data.outliers;
    }

    pub fn points(&self) -> &[ChartPoint] {
        self.store.points()
    }

    /// Reliable "has data" signal for empty-state rendering.
    pub fn has_data(&self) -> bool {
        !self.store.is_empty()
    }

    pub fn weight_range(&self) -> Option<WeightRange> {
        self.weight_range
    }

    pub fn outlier_report(&self) -> OutlierReport {
        self.last_outliers
    }

    /// Points inside the padded viewport around the scroll position.
    pub fn visible_points(&self) -> &[ChartPoint] {
        let center = match self.scroll_position.or_else(|| self.store.last().map(|p| p.date)) {
            Some(center) => center,
            None => return &[],
        };
        self.store.visible(
            center,
            Duration::try_days(self.policy.window_days).unwrap_or(Duration::MAX),
            Duration::try_days(self.policy.padding_days).unwrap_or(Duration::MAX),
            self.policy.windowing_threshold,
        )
    }

    pub fn interpolated_weight_at(&self, date: DateTime<Utc>) -> Option<f64> {
        self.store.interpolate(date)
    }

    /// Select the point closest to `date`; clears the selection when empty.
    pub fn select_point_at_date(&mut self, date: DateTime<Utc>) {
        self.selected = self.store.nearest(date).cloned();
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_point(&self) -> Option<&ChartPoint> {
        self.selected.as_ref()
    }

    pub fn selected_date(&self) -> Option<DateTime<Utc>> {
        self.selected.as_ref().map(|p| p.date)
    }

    pub fn state(&self) -> SelectionState {
        if self.selected.is_some() {
            SelectionState::Selected
        } else {
            SelectionState::Idle
        }
    }

    pub fn scroll_to(&mut self, center: DateTime<Utc>) {
        self.scroll_position = Some(center);
    }

    pub fn scroll_position(&self) -> Option<DateTime<Utc>> {
        self.scroll_position
    }

    pub fn format_date(&self, date: DateTime<Utc>) -> String {
        let local = date.with_timezone(&self.offset);
        match self.kind {
            SectionKind::Week | SectionKind::Month => local.format("%Y/%m/%d").to_string(),
            SectionKind::Year => local.format("%Y/%m").to_string(),
        }
    }

    pub fn format_weekday(&self, date: DateTime<Utc>) -> &'static str {
        format::format_weekday(date, self.offset)
    }

    /// Compact x-axis label.
    pub fn format_axis_label(&self, date: DateTime<Utc>) -> String {
        match self.kind {
            SectionKind::Week => format::format_weekday(date, self.offset).to_string(),
            SectionKind::Month => date.with_timezone(&self.offset).format("%-d").to_string(),
            SectionKind::Year => format::format_month_letter(date, self.offset).to_string(),
        }
    }

    pub fn weight_display_value(&self) -> String {
        format::weight_display(self.selected.as_ref())
    }

    pub fn weight_display_label(&self) -> &'static str {
        match self.kind {
            SectionKind::Week | SectionKind::Month => "Weight",
            SectionKind::Year => "Avg. Weight",
        }
    }

    pub fn bmi_display(&self) -> Option<String> {
        format::format_bmi(self.selected.as_ref().and_then(|p| p.bmi_raw()))
    }

    pub fn summary(&self) -> SectionSummary {
        let points = self.store.points();
        let first_weight = points.first().map(|p| p.weight);
        let last_weight = points.last().map(|p| p.weight);
        let mean_weight = if points.is_empty() {
            None
        } else {
            Some(points.iter().map(|p| p.weight).sum::<f64>() / points.len() as f64)
        };
        SectionSummary {
            kind: self.kind,
            point_count: points.len(),
            first_weight,
            last_weight,
            change: first_weight.zip(last_weight).map(|(f, l)| l - f),
            mean_weight,
        }
    }

    pub fn snapshot(&self) -> SectionSnapshot {
        SectionSnapshot {
            summary: self.summary(),
            state: self.state(),
            weight_range: self.weight_range,
            selected_date: self.selected_date().map(|d| self.format_date(d)),
            scroll_position: self.scroll_position,
            weight_display_value: self.weight_display_value(),
            weight_display_label: self.weight_display_label(),
            bmi: self.bmi_display(),
            visible_points: self.visible_points().to_vec(),
        }
    }
}
