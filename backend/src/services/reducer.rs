//! Reduction of the create/delete operation log into current entries.
//!
//! Rows sharing an `entry_timestamp` are the history of one logical entry.
//! A delete anywhere in that history is a tombstone: the key is gone no
//! matter what else was logged for it or in which order it arrived.

use std::collections::HashMap;

use crate::models::RawEntry;
use crate::services::timestamp::parse_timestamp;

/// Counters describing one reduction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReductionStats {
    pub input_rows: usize,
    pub groups: usize,
    pub tombstoned: usize,
    /// Groups with no create and no delete (only other operations).
    pub without_create: usize,
    /// Groups that carried more than one create row.
    pub duplicate_creates: usize,
    /// Entries that survived reduction.
    pub valid: usize,
}

/// Reduce an operation log to at most one valid entry per `entry_timestamp`.
///
/// Output is ordered by `entry_timestamp` string. When a group holds several
/// creates, the one with the latest parsed `server_timestamp` wins; rows
/// whose server timestamp does not parse count as oldest, and remaining ties
/// go to the row seen first.
pub fn reduce_operations(entries: &[RawEntry]) -> Vec<RawEntry> {
    reduce_operations_with_stats(entries).0
}

/// Same as [`reduce_operations`], also returning pass counters.
pub fn reduce_operations_with_stats(entries: &[RawEntry]) -> (Vec<RawEntry>, ReductionStats) {
    let mut groups: HashMap<&str, Vec<&RawEntry>> = HashMap::new();
    for entry in entries {
        groups
            .entry(entry.entry_timestamp.as_str())
            .or_default()
            .push(entry);
    }

    let mut stats = ReductionStats {
        input_rows: entries.len(),
        groups: groups.len(),
        ..Default::default()
    };

    let mut valid: Vec<RawEntry> = Vec::with_capacity(groups.len());
    for members in groups.values() {
        if members.iter().any(|e| e.operation_type.is_delete()) {
            stats.tombstoned += 1;
            continue;
        }

        let creates: Vec<&RawEntry> = members
            .iter()
            .copied()
            .filter(|e| e.operation_type.is_create())
            .collect();
        if creates.len() > 1 {
            stats.duplicate_creates += 1;
        }

        match pick_latest_create(&creates) {
            Some(entry) => valid.push(entry.clone()),
            None => stats.without_create += 1,
        }
    }

    valid.sort_by(|a, b| a.entry_timestamp.cmp(&b.entry_timestamp));
    stats.valid = valid.len();

    log::debug!(
        "Reduced {} log rows in {} groups to {} entries ({} tombstoned, {} without create)",
        stats.input_rows,
        stats.groups,
        valid.len(),
        stats.tombstoned,
        stats.without_create
    );
    if stats.duplicate_creates > 0 {
        log::debug!(
            "{} groups carried duplicate creates; kept latest by server timestamp",
            stats.duplicate_creates
        );
    }

    (valid, stats)
}

/// Members arrive in input order, so a strict `>` keeps the first on ties.
fn pick_latest_create<'a>(creates: &[&'a RawEntry]) -> Option<&'a RawEntry> {
    let mut best: Option<(&RawEntry, Option<chrono::DateTime<chrono::Utc>>)> = None;
    for &candidate in creates {
        let server = parse_timestamp(&candidate.server_timestamp);
        best = match best {
            Some((current, current_server)) if server <= current_server => {
                Some((current, current_server))
            }
            _ => Some((candidate, server)),
        };
    }
    best.map(|(entry, _)| entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OperationType;

    fn create(ts: &str, server: &str, weight: i64) -> RawEntry {
        RawEntry::new(OperationType::Create, ts, server, weight)
    }

    fn delete(ts: &str) -> RawEntry {
        RawEntry::new(OperationType::Delete, ts, "2024-02-01T00:00:00Z", 0)
    }

    #[test]
    fn test_create_then_delete_is_empty() {
        let log = vec![
            create("2024-01-01T00:00:00Z", "2024-01-01T00:00:00Z", 700),
            RawEntry::new(
                OperationType::Delete,
                "2024-01-01T00:00:00Z",
                "2024-01-01T00:00:00Z",
                700,
            ),
        ];
        assert!(reduce_operations(&log).is_empty());
    }

    #[test]
    fn test_delete_before_create_still_wins() {
        let log = vec![
            delete("2024-01-02T00:00:00Z"),
            create("2024-01-02T00:00:00Z", "2024-01-02T00:00:01Z", 700),
            create("2024-01-03T00:00:00Z", "2024-01-03T00:00:01Z", 710),
        ];
        let (out, stats) = reduce_operations_with_stats(&log);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].entry_timestamp, "2024-01-03T00:00:00Z");
        assert_eq!(stats.tombstoned, 1);
        assert_eq!(stats.groups, 2);
    }

    #[test]
    fn test_delete_only_group_absent() {
        let log = vec![delete("2024-01-05T00:00:00Z")];
        assert!(reduce_operations(&log).is_empty());
    }

    #[test]
    fn test_other_operations_ignored() {
        let log = vec![
            RawEntry::new(
                OperationType::Other("update".into()),
                "2024-01-04T00:00:00Z",
                "",
                680,
            ),
            create("2024-01-04T00:00:00Z", "2024-01-04T00:00:00Z", 690),
            RawEntry::new(OperationType::Other("sync".into()), "2024-01-06T00:00:00Z", "", 1),
        ];
        let (out, stats) = reduce_operations_with_stats(&log);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].weight, 690);
        assert_eq!(stats.without_create, 1);
    }

    #[test]
    fn test_duplicate_creates_pick_latest_server_timestamp() {
        let log = vec![
            create("2024-01-07T00:00:00Z", "2024-01-07T10:00:00Z", 700),
            create("2024-01-07T00:00:00Z", "2024-01-07T12:00:00Z", 705),
            create("2024-01-07T00:00:00Z", "garbage", 710),
        ];
        let (out, stats) = reduce_operations_with_stats(&log);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].weight, 705);
        assert_eq!(stats.duplicate_creates, 1);
    }

    #[test]
    fn test_duplicate_creates_tie_keeps_first() {
        let log = vec![
            create("k", "2024-01-07T10:00:00Z", 700),
            create("k", "2024-01-07T10:00:00Z", 705),
        ];
        assert_eq!(reduce_operations(&log)[0].weight, 700);
    }

    #[test]
    fn test_output_sorted_by_entry_timestamp() {
        let log = vec![
            create("2024-01-09T00:00:00Z", "", 700),
            create("2024-01-01T00:00:00Z", "", 701),
            create("2024-01-05T00:00:00Z", "", 702),
        ];
        let out = reduce_operations(&log);
        let keys: Vec<&str> = out.iter().map(|e| e.entry_timestamp.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "2024-01-01T00:00:00Z",
                "2024-01-05T00:00:00Z",
                "2024-01-09T00:00:00Z"
            ]
        );
    }

    #[test]
    fn test_idempotent() {
        let log = vec![
            create("a", "", 700),
            create("a", "2024-01-01T00:00:00Z", 701),
            delete("b"),
            create("b", "", 702),
            create("c", "", 703),
        ];
        let once = reduce_operations(&log);
        let twice = reduce_operations(&once);
        assert_eq!(once, twice);
    }
}
