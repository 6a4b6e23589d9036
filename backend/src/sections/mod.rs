//! Period-specific chart sections (week, month, year).
//!
//! Each section owns its point sequence, selection and scroll position and
//! is rebuilt wholesale from the entry log.

pub mod controller;
pub mod format;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::services::AggregationMode;

pub use controller::{SectionController, SectionData, SectionSnapshot, SectionSummary, SelectionState};

/// Time-period granularity of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    #[default]
    Week,
    Month,
    Year,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [SectionKind::Week, SectionKind::Month, SectionKind::Year];

    /// Week and month chart daily points; year charts monthly averages.
    pub fn aggregation_mode(self) -> AggregationMode {
        match self {
            SectionKind::Week | SectionKind::Month => AggregationMode::Daily,
            SectionKind::Year => AggregationMode::Monthly,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Week => "week",
            SectionKind::Month => "month",
            SectionKind::Year => "year",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" | "weekly" | "w" => Ok(SectionKind::Week),
            "month" | "monthly" | "m" => Ok(SectionKind::Month),
            "year" | "yearly" | "y" => Ok(SectionKind::Year),
            other => Err(format!(
                "Unknown section '{}'. Use week, month, or year.",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_kind_from_str() {
        assert_eq!("Week".parse::<SectionKind>().unwrap(), SectionKind::Week);
        assert_eq!("monthly".parse::<SectionKind>().unwrap(), SectionKind::Month);
        assert_eq!("y".parse::<SectionKind>().unwrap(), SectionKind::Year);
        assert!("decade".parse::<SectionKind>().is_err());
    }

    #[test]
    fn test_aggregation_mode_per_section() {
        assert_eq!(SectionKind::Week.aggregation_mode(), AggregationMode::Daily);
        assert_eq!(SectionKind::Month.aggregation_mode(), AggregationMode::Daily);
        assert_eq!(SectionKind::Year.aggregation_mode(), AggregationMode::Monthly);
    }
}
