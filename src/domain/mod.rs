//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - parsed file content (`RawRecord`, `KpiRow`)
//! - aggregated outputs (`DailyMetrics`, `RangeSeries`)
//! - dashboard configuration (`DashConfig`, `Metric`)

pub mod types;

pub use types::*;
