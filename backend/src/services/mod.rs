//! Service layer: the stateless stages of the chart pipeline.
//!
//! Data flows one way:
//! entry log → [`reducer`] → [`aggregation`] → [`outliers`] → [`point_store`].
//! Section controllers in [`crate::sections`] compose these stages.

pub mod aggregation;
pub mod outliers;
pub mod point_store;
pub mod reducer;
pub mod timestamp;

pub use aggregation::{aggregate, resolve_dates, AggregationMode, DatedEntry};
pub use outliers::{filter_outliers, filter_with_recent_exemption, OutlierReport};
pub use point_store::PointStore;
pub use reducer::{reduce_operations, reduce_operations_with_stats, ReductionStats};
pub use timestamp::parse_timestamp;
