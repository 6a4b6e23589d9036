//! Top-level chart state: the three sections, the active tab and the
//! rebuild generation guard.
//!
//! A rebuild is split into a pure compute step ([`RebuildResult::compute`])
//! and a publish step ([`WeightChartManager::apply_rebuild`]). Each rebuild
//! carries a [`RebuildTicket`]; only the newest ticket may publish, so an
//! older rebuild finishing late cannot overwrite newer data.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::ChartConfig;
use crate::error::ChartResult;
use crate::models::RawEntry;
use crate::sections::{SectionController, SectionData, SectionKind, SectionSnapshot};
use crate::services::{reduce_operations_with_stats, ReductionStats};

/// Proof that a rebuild was started at a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RebuildTicket(u64);

impl RebuildTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Output of one full pipeline run over an entry log.
#[derive(Debug, Clone)]
pub struct RebuildResult {
    pub stats: ReductionStats,
    pub week: SectionData,
    pub month: SectionData,
    pub year: SectionData,
}

impl RebuildResult {
    /// Reduce the log once and build every section from the valid entries.
    pub fn compute(entries: &[RawEntry], config: &ChartConfig, now: DateTime<Utc>) -> Self {
        let (valid, stats) = reduce_operations_with_stats(entries);
        Self {
            stats,
            week: SectionData::compute(SectionKind::Week, &valid, config, now),
            month: SectionData::compute(SectionKind::Month, &valid, config, now),
            year: SectionData::compute(SectionKind::Year, &valid, config, now),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerSnapshot {
    pub active_tab: SectionKind,
    pub generation: u64,
    pub valid_entries: usize,
    pub sections: Vec<SectionSnapshot>,
}

pub struct WeightChartManager {
    config: ChartConfig,
    clock: Arc<dyn Clock>,
    week: SectionController,
    month: SectionController,
    year: SectionController,
    active_tab: SectionKind,
    issued: u64,
    published: u64,
    last_stats: ReductionStats,
}

impl WeightChartManager {
    pub fn new(config: ChartConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ChartConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            week: SectionController::new(SectionKind::Week, &config),
            month: SectionController::new(SectionKind::Month, &config),
            year: SectionController::new(SectionKind::Year, &config),
            config,
            clock,
            active_tab: SectionKind::default(),
            issued: 0,
            published: 0,
            last_stats: ReductionStats::default(),
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn section(&self, kind: SectionKind) -> &SectionController {
        match kind {
            SectionKind::Week => &self.week,
            SectionKind::Month => &self.month,
            SectionKind::Year => &self.year,
        }
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> &mut SectionController {
        match kind {
            SectionKind::Week => &mut self.week,
            SectionKind::Month => &mut self.month,
            SectionKind::Year => &mut self.year,
        }
    }

    pub fn active_tab(&self) -> SectionKind {
        self.active_tab
    }

    /// Switching tabs never triggers a rebuild.
    pub fn set_active_tab(&mut self, kind: SectionKind) {
        self.active_tab = kind;
    }

    pub fn active_section(&self) -> &SectionController {
        self.section(self.active_tab)
    }

    pub fn active_section_mut(&mut self) -> &mut SectionController {
        self.section_mut(self.active_tab)
    }

    /// Generation of the data currently published (0 before any rebuild).
    pub fn generation(&self) -> u64 {
        self.published
    }

    pub fn last_stats(&self) -> ReductionStats {
        self.last_stats
    }

    /// Start a rebuild; any ticket issued earlier becomes stale.
    pub fn begin_rebuild(&mut self) -> RebuildTicket {
        self.issued += 1;
        RebuildTicket(self.issued)
    }

    pub fn is_current(&self, ticket: RebuildTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Publish `result` if `ticket` is the newest issued. Returns whether
    /// the result was applied.
    pub fn apply_rebuild(&mut self, ticket: RebuildTicket, result: RebuildResult) -> bool {
        if !self.is_current(ticket) {
            log::debug!(
                "Discarding stale rebuild {} (newest is {})",
                ticket.0,
                self.issued
            );
            return false;
        }
        self.week.apply(result.week);
        self.month.apply(result.month);
        self.year.apply(result.year);
        self.last_stats = result.stats;
        self.published = ticket.0;
        true
    }

    /// Rebuild every section synchronously from a raw entry log.
    pub fn process_entries(&mut self, entries: &[RawEntry]) {
        let ticket = self.begin_rebuild();
        let result = RebuildResult::compute(entries, &self.config, self.clock.now());
        self.apply_rebuild(ticket, result);
    }

    pub fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            active_tab: self.active_tab,
            generation: self.published,
            valid_entries: self.last_stats.valid,
            sections: SectionKind::ALL
                .iter()
                .map(|&kind| self.section(kind).snapshot())
                .collect(),
        }
    }
}

/// Cloneable handle sharing one manager between tasks.
#[derive(Clone)]
pub struct SharedChartManager {
    inner: Arc<RwLock<WeightChartManager>>,
}

impl SharedChartManager {
    pub fn new(manager: WeightChartManager) -> Self {
        Self {
            inner: Arc::new(RwLock::new(manager)),
        }
    }

    /// Run `f` with read access to the manager.
    pub fn read<R>(&self, f: impl FnOnce(&WeightChartManager) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with write access to the manager.
    pub fn write<R>(&self, f: impl FnOnce(&mut WeightChartManager) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Run the pipeline on the blocking pool and publish the result through
    /// the generation guard. Returns `Ok(false)` when a newer rebuild was
    /// started in the meantime.
    pub async fn rebuild_in_background(&self, entries: Vec<RawEntry>) -> ChartResult<bool> {
        let (ticket, config, now) = self.write(|m| (m.begin_rebuild(), m.config.clone(), m.now()));
        log::debug!("Rebuild {} started with {} entries", ticket.0, entries.len());

        let result =
            tokio::task::spawn_blocking(move || RebuildResult::compute(&entries, &config, now))
                .await?;

        Ok(self.write(|m| m.apply_rebuild(ticket, result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::OperationType;
    use chrono::TimeZone;

    fn manager() -> WeightChartManager {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        WeightChartManager::with_clock(ChartConfig::default(), Arc::new(FixedClock(now)))
    }

    fn entries() -> Vec<RawEntry> {
        vec![
            RawEntry::new(OperationType::Create, "2024-06-01T08:00:00Z", "2024-06-01T08:00:01Z", 700),
            RawEntry::new(OperationType::Create, "2024-06-02T08:00:00Z", "2024-06-02T08:00:01Z", 702),
            RawEntry::new(OperationType::Delete, "2024-06-02T08:00:00Z", "2024-06-02T09:00:00Z", 0),
            RawEntry::new(OperationType::Create, "2024-06-03T08:00:00Z", "2024-06-03T08:00:01Z", 698),
        ]
    }

    #[test]
    fn test_process_entries_rebuilds_all_sections() {
        let mut m = manager();
        m.process_entries(&entries());
        assert_eq!(m.generation(), 1);
        assert_eq!(m.section(SectionKind::Week).points().len(), 2);
        assert_eq!(m.section(SectionKind::Month).points().len(), 2);
        assert_eq!(m.section(SectionKind::Year).points().len(), 1);
        assert_eq!(m.last_stats().tombstoned, 1);
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut m = manager();
        let old = m.begin_rebuild();
        let new = m.begin_rebuild();
        let now = m.now();

        let newer = RebuildResult::compute(&entries(), m.config(), now);
        let older = RebuildResult::compute(&entries()[..1], m.config(), now);

        assert!(m.apply_rebuild(new, newer));
        assert!(!m.apply_rebuild(old, older));
        assert_eq!(m.generation(), new.generation());
        assert_eq!(m.section(SectionKind::Week).points().len(), 2);
    }

    #[test]
    fn test_tab_switch_keeps_data() {
        let mut m = manager();
        m.process_entries(&entries());
        assert_eq!(m.active_tab(), SectionKind::Week);
        m.set_active_tab(SectionKind::Year);
        assert_eq!(m.active_section().kind(), SectionKind::Year);
        assert_eq!(m.generation(), 1);
        assert!(m.active_section().has_data());
    }

    #[test]
    fn test_snapshot_lists_sections_in_order() {
        let mut m = manager();
        m.process_entries(&entries());
        let snap = m.snapshot();
        assert_eq!(snap.valid_entries, 2);
        let kinds: Vec<_> = snap.sections.iter().map(|s| s.summary.kind).collect();
        assert_eq!(kinds, SectionKind::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_rebuild_in_background_publishes() {
        let shared = SharedChartManager::new(manager());
        let applied = shared.rebuild_in_background(entries()).await.unwrap();
        assert!(applied);
        assert_eq!(shared.read(|m| m.generation()), 1);
        assert!(shared.read(|m| m.section(SectionKind::Month).has_data()));
    }
}
