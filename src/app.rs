//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - picks a data source (remote service or demo generator)
//! - runs the fetch -> derive -> project pipeline
//! - prints cards, tables and plots
//! - writes optional exports

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::cli::{Command, FilterArgs, LocationsArgs, ShowArgs, SourceArgs};
use crate::data::{AnalyticsClient, AnalyticsSource, DemoSource};
use crate::domain::Filters;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `estate` binary.
pub fn run() -> Result<(), AppError> {
    // `estate` and `estate -l boston` behave like `estate tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_logging(matches!(cli.command, Command::Tui(_)));

    match cli.command {
        Command::Locations(args) => handle_locations(&cli.source, args),
        Command::Metrics => handle_metrics(&cli.source),
        Command::Show(args) => handle_show(&cli.source, args),
        Command::Tui(args) => {
            let source = build_source(&cli.source)?;
            crate::tui::run(source, filters_from_args(&args.filters))
        }
    }
}

/// Initialize `env_logger` (default level `warn`, overridable via `RUST_LOG`).
///
/// The TUI owns the terminal, so its log lines go to a file in the temp dir.
fn init_logging(to_file: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if to_file {
        let path = std::env::temp_dir().join("estate-tui.log");
        match std::fs::File::create(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(_) => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }
    // Already initialized when the library is driven twice in one process.
    let _ = builder.try_init();
}

/// Build the data source selected on the command line.
pub fn build_source(args: &SourceArgs) -> Result<Arc<dyn AnalyticsSource>, AppError> {
    if args.demo {
        log::info!("using demo data (seed {})", args.seed);
        return Ok(Arc::new(DemoSource::new(args.seed)));
    }
    Ok(Arc::new(AnalyticsClient::from_env(args.api_url.as_deref())?))
}

pub fn filters_from_args(args: &FilterArgs) -> Filters {
    let mut filters = Filters {
        housing_type: args.housing_type,
        location: args.location.clone().unwrap_or_default(),
        compare_locations: Vec::new(),
        metric: args.metric.clone(),
        start_year: args.start_year,
        end_year: args.end_year,
        chart_mode: args.chart,
        show_inflation: args.inflation,
    };
    for location in &args.compare {
        if !filters.add_comparison(location) {
            log::warn!("ignoring comparison location '{location}'");
        }
    }
    filters
}

fn handle_locations(source: &SourceArgs, args: LocationsArgs) -> Result<(), AppError> {
    let source = build_source(source)?;
    let locations = source.fetch_locations(args.housing_type)?;
    if locations.is_empty() {
        println!("No locations for {}.", args.housing_type.display_name());
        return Ok(());
    }
    for location in locations {
        println!("{location}");
    }
    Ok(())
}

fn handle_metrics(source: &SourceArgs) -> Result<(), AppError> {
    let source = build_source(source)?;
    let catalog = source.fetch_metrics()?;
    for (key, info) in &catalog {
        println!("{key:<28} {:<11} {}", info.unit.label(), info.description);
    }
    Ok(())
}

fn handle_show(source_args: &SourceArgs, args: ShowArgs) -> Result<(), AppError> {
    let filters = filters_from_args(&args.filters);

    let source = build_source(source_args)?;
    let catalog = source.fetch_metrics()?;
    if !catalog.contains_key(&filters.metric) {
        return Err(AppError::input(format!(
            "Unknown metric '{}' (see `estate metrics`).",
            filters.metric
        )));
    }
    let view = pipeline::fetch_view(source.as_ref(), &filters, &catalog)?;

    println!("{}", view.title);
    println!(
        "{} | {}-{} | {} | source: {}",
        filters.housing_type.display_name(),
        filters.start_year,
        filters.end_year,
        filters.chart_mode.display_name(),
        source.describe(),
    );
    println!();
    print!("{}", crate::report::format_cards(&view.cards));
    println!();

    if view.payload.primary.is_empty() {
        println!("No data available for the selected filters.");
    } else {
        print!(
            "{}",
            crate::report::format_chart_table(&view.table, view.payload.primary.unit)
        );
        if args.plot {
            println!();
            print!(
                "{}",
                crate::plot::render_chart_plot(&view.table, args.width, args.height)
            );
        }
    }

    if let Some(path) = export_path(args.export.as_deref(), &filters.metric) {
        let table = pipeline::export_table(&view.payload, filters.show_inflation);
        crate::io::write_chart_csv_file(&path, &table)?;
        println!("Exported {} rows to {}", table.rows.len(), path.display());
    }
    Ok(())
}

/// `--export` given without a value means the default `<metric>_data.csv`.
fn export_path(flag: Option<&str>, metric: &str) -> Option<PathBuf> {
    match flag? {
        "" => Some(crate::io::default_export_path(metric)),
        path => Some(PathBuf::from(path)),
    }
}

/// Rewrite argv so `estate` defaults to `estate tui`.
///
/// Rules:
/// - `estate`                      -> `estate tui`
/// - `estate -l boston ...`        -> `estate tui -l boston ...`
/// - `estate --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "locations" | "metrics" | "show" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
