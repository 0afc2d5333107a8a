//! Shared "dashboard pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch payload -> derive statistics -> project chart rows -> build cards
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use crate::analytics::{ChartTable, ValueMode, derive_statistics, project};
use crate::data::AnalyticsSource;
use crate::domain::{AnalyticsPayload, DerivedStatistics, Filters, MetricCatalog};
use crate::error::AppError;
use crate::report::{MetricCard, chart_title, summary_cards};

/// Everything rendered for one payload under one set of filters.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub title: String,
    pub payload: AnalyticsPayload,
    pub stats: DerivedStatistics,
    pub table: ChartTable,
    pub cards: Vec<MetricCard>,
}

/// Derive statistics and chart rows for an already fetched payload.
///
/// Pure recomputation: call again whenever the payload or display mode changes.
pub fn build_view(payload: AnalyticsPayload, filters: &Filters, catalog: &MetricCatalog) -> DashboardView {
    let stats = derive_statistics(&payload, filters.start_year, filters.end_year);
    let table = project(
        &payload,
        ValueMode::for_chart(filters.chart_mode),
        filters.show_inflation,
    );
    let cards = summary_cards(&stats, payload.primary.unit);
    let title = chart_title(
        catalog,
        &payload.primary.metric,
        &payload.primary.location,
        payload.comparisons.len(),
    );

    DashboardView {
        title,
        payload,
        stats,
        table,
        cards,
    }
}

/// Fetch a payload for `filters` and build its view.
pub fn fetch_view(
    source: &dyn AnalyticsSource,
    filters: &Filters,
    catalog: &MetricCatalog,
) -> Result<DashboardView, AppError> {
    let query = filters.to_query()?;
    let payload = source.fetch_payload(&query)?;
    Ok(build_view(payload, filters, catalog))
}

/// Rows written by CSV export: raw values, with the inflation column when the
/// overlay is on, regardless of the chart mode on screen.
pub fn export_table(payload: &AnalyticsPayload, show_inflation: bool) -> ChartTable {
    project(payload, ValueMode::Raw, show_inflation)
}
