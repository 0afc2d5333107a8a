//! Domain types used throughout the dashboard.
//!
//! This module defines:
//!
//! - wire types for the analytics service (`Series`, `AnalyticsPayload`, `MetricInfo`)
//! - filter enums and the filter selection state (`HousingType`, `ChartMode`, `Filters`)
//! - derived outputs (`Trend`, `DerivedStatistics`)

pub mod filters;
pub mod types;

pub use filters::*;
pub use types::*;
