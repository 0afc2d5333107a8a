//! `estate-dash` library crate.
//!
//! The binary (`estate`) is a thin wrapper around this library so that:
//!
//! - the derivation engine is testable without spawning processes
//! - the CLI and the TUI share one fetch -> derive -> project pipeline
//! - the remote client and the demo generator are interchangeable sources

pub mod analytics;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod tui;
