//! Data sources and reference data.
//!
//! - remote analytics service client (`client`)
//! - offline synthetic source (`demo`)
//! - the `AnalyticsSource` seam both implement (`source`)
//! - static inflation reference table (`inflation`)

pub mod client;
pub mod demo;
pub mod inflation;
pub mod source;

pub use client::AnalyticsClient;
pub use demo::DemoSource;
pub use source::AnalyticsSource;
