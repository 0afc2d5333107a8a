//! Pure analytics over fetched payloads.
//!
//! - summary statistics and YoY series (`stats`)
//! - row-per-year chart projection (`chart`)

pub mod chart;
pub mod stats;

pub use chart::{ChartRow, ChartTable, INFLATION_KEY, ValueMode, project};
pub use stats::{YoyPoint, derive_statistics, yoy_change};
