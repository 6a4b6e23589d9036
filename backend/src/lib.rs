//! # Weight Chart
//!
//! Charting pipeline for body-weight entry logs.
//!
//! This crate turns an append-only log of create/delete operations on weight
//! entries into chart-ready point sequences for three time-period sections
//! (week, month and year), together with the selection, scrolling and
//! formatting state a chart renderer needs.
//!
//! ## Features
//!
//! - **Timestamp Parsing**: Tolerant parsing of heterogeneous timestamp strings
//! - **Log Reduction**: Collapse create/delete histories into current entries
//! - **Aggregation**: Daily latest-wins buckets and monthly averages
//! - **Outlier Filtering**: Absolute bounds, IQR fences and jump detection
//! - **Windowing**: Binary-searched viewport, nearest-point and interpolation queries
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Raw entries, chart points and weight ranges
//! - [`services`]: Stateless pipeline stages
//! - [`sections`]: Per-period controllers and display formatting
//! - [`manager`]: The three sections, active tab and rebuild generation guard
//! - [`config`]: TOML configuration
//! - [`sample`]: Deterministic sample logs
//!
//! ## Logging
//!
//! The library logs through the `log` facade; binaries choose the subscriber.

pub mod clock;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod sample;
pub mod sections;
pub mod services;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ChartConfig;
pub use error::{ChartError, ChartResult};
pub use manager::{RebuildResult, RebuildTicket, SharedChartManager, WeightChartManager};
pub use models::{parse_entries_json, ChartPoint, OperationType, RawEntry, WeightRange, WeightUnit};
pub use sections::{SectionController, SectionKind};
