//! Input/output helpers.
//!
//! - chart table CSV export (`export`)

pub mod export;

pub use export::*;
