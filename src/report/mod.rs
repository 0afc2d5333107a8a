//! Reporting utilities: summary cards and text tables.

pub mod format;

pub use format::*;
