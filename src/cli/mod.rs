//! Command-line parsing for the market analytics dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the analytics and rendering code.

use clap::{Args, Parser, Subcommand};

use crate::domain::{ChartMode, HousingType};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "estate", version, about = "Real-estate market analytics dashboard")]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List available locations for a property type.
    Locations(LocationsArgs),
    /// List the metric catalog (key, unit, description).
    Metrics,
    /// Fetch one series set, print summary cards and the per-year table, and optionally plot or export CSV.
    Show(ShowArgs),
    /// Launch the interactive dashboard.
    ///
    /// Filters are edited in place; every change refetches in the background.
    Tui(TuiArgs),
}

/// Where data comes from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Analytics API base URL (overrides ESTATE_API_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Use the built-in synthetic data instead of the remote service.
    #[arg(long, global = true)]
    pub demo: bool,

    /// Seed for `--demo` data.
    #[arg(long, global = true, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Args)]
pub struct LocationsArgs {
    /// Property type.
    #[arg(short = 't', long, value_enum, default_value_t = HousingType::Condos)]
    pub housing_type: HousingType,
}

/// Filter flags shared by `show` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct FilterArgs {
    /// Property type.
    #[arg(short = 't', long, value_enum, default_value_t = HousingType::Condos)]
    pub housing_type: HousingType,

    /// Primary location (`town` or `town/neighborhood`).
    #[arg(short = 'l', long)]
    pub location: Option<String>,

    /// Comparison location (repeatable, up to 5).
    #[arg(short = 'c', long = "compare", value_name = "LOCATION")]
    pub compare: Vec<String>,

    /// Metric key (see `estate metrics`).
    #[arg(short = 'm', long, default_value = "median_price")]
    pub metric: String,

    /// First year of the range.
    #[arg(long, default_value_t = 2015)]
    pub start_year: i32,

    /// Last year of the range.
    #[arg(long, default_value_t = 2023)]
    pub end_year: i32,

    /// Chart mode (`yoy` switches values to year-over-year % change).
    #[arg(long, value_enum, default_value_t = ChartMode::Line)]
    pub chart: ChartMode,

    /// Overlay published inflation rates.
    #[arg(long)]
    pub inflation: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Render an ASCII plot in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the per-year rows to CSV (defaults to `<metric>_data.csv` when given without a value).
    #[arg(long, value_name = "CSV", num_args = 0..=1, default_missing_value = "")]
    pub export: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub filters: FilterArgs,
}

impl Default for TuiArgs {
    fn default() -> Self {
        Self {
            filters: FilterArgs {
                housing_type: HousingType::Condos,
                location: None,
                compare: Vec::new(),
                metric: "median_price".to_string(),
                start_year: 2015,
                end_year: 2023,
                chart: ChartMode::Line,
                inflation: false,
            },
        }
    }
}
