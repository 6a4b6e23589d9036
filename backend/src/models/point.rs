use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::entry::{RawEntry, WeightUnit};

/// Chart-ready projection of one (or one bucket of) weight entries.
///
/// Points are immutable; sections rebuild their point lists wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub date: DateTime<Utc>,
    /// Weight in the source entry's unit.
    pub weight: f64,
    pub source_entry: Arc<RawEntry>,
}

impl ChartPoint {
    pub fn new(date: DateTime<Utc>, weight: f64, source_entry: Arc<RawEntry>) -> Self {
        Self {
            date,
            weight,
            source_entry,
        }
    }

    pub fn unit(&self) -> WeightUnit {
        self.source_entry.weight_unit()
    }

    /// Weight converted to kilograms, used for plausibility bounds.
    pub fn weight_kg(&self) -> f64 {
        self.weight * self.unit().kg_factor()
    }

    /// Raw fixed-point BMI (×10) carried by the source entry.
    pub fn bmi_raw(&self) -> Option<i64> {
        self.source_entry.bmi
    }
}

/// Axis range for a section, padded so points never touch the chart edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightRange {
    pub min: f64,
    pub max: f64,
}

impl WeightRange {
    /// Range over `points` padded by 10% of the spread.
    ///
    /// A flat series is padded by 10% of its value (1.0 when that is zero).
    /// Returns `None` for an empty slice.
    pub fn from_points(points: &[ChartPoint]) -> Option<Self> {
        let first = points.first()?;
        let (min, max) = points
            .iter()
            .fold((first.weight, first.weight), |(lo, hi), p| {
                (lo.min(p.weight), hi.max(p.weight))
            });

        let spread = max - min;
        let pad = if spread > f64::EPSILON {
            spread * 0.1
        } else if max.abs() > f64::EPSILON {
            max.abs() * 0.1
        } else {
            1.0
        };

        Some(Self {
            min: min - pad,
            max: max + pad,
        })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, weight: f64) -> bool {
        weight >= self.min && weight <= self.max
    }
}
