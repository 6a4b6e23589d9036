//! Chart pipeline configuration.
//!
//! Settings are read from a TOML file. Every key is optional; a section table
//! only overrides the keys it names, the rest keep that section's defaults.
//!
//! ```toml
//! utc_offset_minutes = 480
//!
//! [outliers]
//! max_jump_ratio = 0.4
//!
//! [month]
//! padding_days = 45
//! ```

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ChartError, ChartResult};
use crate::sections::SectionKind;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "WEIGHT_CHART_CONFIG";

/// Default config file name searched by [`ChartConfig::from_default_location`].
pub const CONFIG_FILE_NAME: &str = "weight_chart.toml";

const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Upper bound for every day-count setting (about a century).
pub const MAX_SPAN_DAYS: i64 = 36_500;

/// Thresholds for the outlier filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierSettings {
    /// Lowest plausible body weight in kilograms.
    pub min_weight: f64,
    /// Highest plausible body weight in kilograms.
    pub max_weight: f64,
    pub iqr_multiplier: f64,
    /// Largest accepted relative change from the last kept point.
    pub max_jump_ratio: f64,
    /// Below this many points the filter is a no-op.
    pub min_points: usize,
}

impl Default for OutlierSettings {
    fn default() -> Self {
        Self {
            min_weight: 2.0,
            max_weight: 200.0,
            iqr_multiplier: 1.5,
            max_jump_ratio: 0.5,
            min_points: 3,
        }
    }
}

/// Per-section windowing and filtering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionPolicy {
    /// Width of the visible viewport.
    pub window_days: i64,
    /// Extra span loaded on both sides of the viewport.
    pub padding_days: i64,
    /// Point count below which windowing is skipped.
    pub windowing_threshold: usize,
    /// Trailing span exempt from outlier filtering; 0 disables the exemption.
    pub recent_exempt_days: i64,
}

impl SectionPolicy {
    pub const fn week() -> Self {
        Self {
            window_days: 7,
            padding_days: 3,
            windowing_threshold: 50,
            recent_exempt_days: 7,
        }
    }

    pub const fn month() -> Self {
        Self {
            window_days: 30,
            padding_days: 30,
            windowing_threshold: 100,
            recent_exempt_days: 90,
        }
    }

    pub const fn year() -> Self {
        Self {
            window_days: 365,
            padding_days: 180,
            windowing_threshold: 100,
            recent_exempt_days: 0,
        }
    }

    pub const fn default_for(kind: SectionKind) -> Self {
        match kind {
            SectionKind::Week => Self::week(),
            SectionKind::Month => Self::month(),
            SectionKind::Year => Self::year(),
        }
    }
}

/// Section table as written in the file; missing keys fall back per section.
#[derive(Debug, Clone, Default, Deserialize)]
struct SectionPolicyFile {
    window_days: Option<i64>,
    padding_days: Option<i64>,
    windowing_threshold: Option<usize>,
    recent_exempt_days: Option<i64>,
}

impl SectionPolicyFile {
    fn resolve(self, kind: SectionKind) -> SectionPolicy {
        let base = SectionPolicy::default_for(kind);
        SectionPolicy {
            window_days: self.window_days.unwrap_or(base.window_days),
            padding_days: self.padding_days.unwrap_or(base.padding_days),
            windowing_threshold: self.windowing_threshold.unwrap_or(base.windowing_threshold),
            recent_exempt_days: self.recent_exempt_days.unwrap_or(base.recent_exempt_days),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChartConfigFile {
    utc_offset_minutes: Option<i32>,
    fallback_window_days: Option<i64>,
    #[serde(default)]
    outliers: OutlierSettings,
    #[serde(default)]
    week: SectionPolicyFile,
    #[serde(default)]
    month: SectionPolicyFile,
    #[serde(default)]
    year: SectionPolicyFile,
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    /// Fixed offset used to find calendar day and month boundaries.
    pub utc_offset_minutes: i32,
    /// Span over which entries with unparseable timestamps are spread.
    pub fallback_window_days: i64,
    pub outliers: OutlierSettings,
    pub week: SectionPolicy,
    pub month: SectionPolicy,
    pub year: SectionPolicy,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            fallback_window_days: 30,
            outliers: OutlierSettings::default(),
            week: SectionPolicy::week(),
            month: SectionPolicy::month(),
            year: SectionPolicy::year(),
        }
    }
}

impl ChartConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> ChartResult<Self> {
        let file: ChartConfigFile = toml::from_str(content)?;
        let config = Self {
            utc_offset_minutes: file.utc_offset_minutes.unwrap_or(0),
            fallback_window_days: file.fallback_window_days.unwrap_or(30),
            outliers: file.outliers,
            week: file.week.resolve(SectionKind::Week),
            month: file.month.resolve(SectionKind::Month),
            year: file.year.resolve(SectionKind::Year),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns [`ChartError::ConfigRead`] if the file cannot be read, and a
    /// parse or validation error if its content is unusable.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ChartResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ChartError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("Loaded chart config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from the first standard location that exists.
    ///
    /// Searches for `weight_chart.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    ///
    /// Falls back to defaults when no file is found.
    pub fn from_default_location() -> ChartResult<Self> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        log::debug!("No {} found, using default chart config", CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load configuration from `WEIGHT_CHART_CONFIG` when set, otherwise
    /// from the default location.
    pub fn from_env() -> ChartResult<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Self::from_default_location(),
        }
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> ChartResult<()> {
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ChartError::invalid_config(format!(
                "utc_offset_minutes must be within ±{}, got {}",
                MAX_OFFSET_MINUTES, self.utc_offset_minutes
            )));
        }
        if self.fallback_window_days <= 0 || self.fallback_window_days > MAX_SPAN_DAYS {
            return Err(ChartError::invalid_config(format!(
                "fallback_window_days must be within 1..={}, got {}",
                MAX_SPAN_DAYS, self.fallback_window_days
            )));
        }

        let o = &self.outliers;
        if o.min_weight >= o.max_weight {
            return Err(ChartError::invalid_config(format!(
                "outliers.min_weight ({}) must be below outliers.max_weight ({})",
                o.min_weight, o.max_weight
            )));
        }
        if o.iqr_multiplier < 0.0 || o.max_jump_ratio < 0.0 {
            return Err(ChartError::invalid_config(
                "outliers.iqr_multiplier and outliers.max_jump_ratio must not be negative",
            ));
        }

        for kind in SectionKind::ALL {
            let policy = self.policy(kind);
            if policy.window_days <= 0 {
                return Err(ChartError::invalid_config(format!(
                    "{}.window_days must be positive",
                    kind
                )));
            }
            if policy.window_days > MAX_SPAN_DAYS {
                return Err(ChartError::invalid_config(format!(
                    "{}.window_days must not exceed {}",
                    kind, MAX_SPAN_DAYS
                )));
            }
            if policy.padding_days < 0 || policy.recent_exempt_days < 0 {
                return Err(ChartError::invalid_config(format!(
                    "{}.padding_days and {}.recent_exempt_days must not be negative",
                    kind, kind
                )));
            }
            if policy.padding_days > MAX_SPAN_DAYS || policy.recent_exempt_days > MAX_SPAN_DAYS {
                return Err(ChartError::invalid_config(format!(
                    "{}.padding_days and {}.recent_exempt_days must not exceed {}",
                    kind, kind, MAX_SPAN_DAYS
                )));
            }
        }
        Ok(())
    }

    pub fn policy(&self, kind: SectionKind) -> SectionPolicy {
        match kind {
            SectionKind::Week => self.week,
            SectionKind::Month => self.month,
            SectionKind::Year => self.year,
        }
    }

    /// Offset used for calendar bucketing.
    pub fn calendar_offset(&self) -> FixedOffset {
        // validate() keeps the offset inside FixedOffset's range
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}
