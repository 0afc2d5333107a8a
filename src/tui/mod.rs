//! Ratatui-based terminal UI.
//!
//! The TUI provides a filter panel (property type, location, comparisons,
//! metric, year range, chart mode, inflation overlay), summary cards and a
//! multi-series chart. Every filter change refetches in the background; the
//! event loop applies only the newest response per fetch flow.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Terminal,
};

use crate::analytics::{ChartTable, INFLATION_KEY, ValueMode};
use crate::app::pipeline::{DashboardView, build_view, export_table};
use crate::data::AnalyticsSource;
use crate::domain::{ChartMode, Filters, MAX_YEAR, MIN_YEAR, MetricCatalog, Trend, Unit};
use crate::error::{AppError, EXIT_RUNTIME};

mod fetch;
mod plotters_chart;

use fetch::{FetchFlow, FetchOutcome, Fetcher};
use plotters_chart::{ChartSeries, ChartStyle, DashboardChart, INFLATION_COLOR, palette_color, to_ratatui};

const MSG_LOADING: &str = "Loading data...";
const MSG_SELECT: &str = "Select filters to view data";
const MSG_DATA_ERROR: &str = "Error loading data. Please try again.";
const MSG_LOCATIONS_ERROR: &str = "Error loading locations. Please try again.";
const MSG_METRICS_ERROR: &str = "Error loading metrics. Please try again.";

/// Start the TUI.
pub fn run(source: Arc<dyn AnalyticsSource>, filters: Filters) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(Fetcher::new(source), filters);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(EXIT_RUNTIME, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    HousingType,
    Location,
    Compare,
    Metric,
    StartYear,
    EndYear,
    ChartMode,
    Inflation,
}

const FIELDS: [Field; 8] = [
    Field::HousingType,
    Field::Location,
    Field::Compare,
    Field::Metric,
    Field::StartYear,
    Field::EndYear,
    Field::ChartMode,
    Field::Inflation,
];

struct App {
    fetcher: Fetcher,
    source_name: String,
    filters: Filters,
    locations: Vec<String>,
    catalog: MetricCatalog,
    /// Index into `locations` of the next comparison candidate.
    compare_cursor: usize,
    view: Option<DashboardView>,
    data_failed: bool,
    selected_field: usize,
    status: String,
}

impl App {
    fn new(mut fetcher: Fetcher, filters: Filters) -> Self {
        fetcher.request_metrics();
        fetcher.request_locations(filters.housing_type);
        Self {
            source_name: fetcher.describe_source(),
            fetcher,
            filters,
            locations: Vec::new(),
            catalog: MetricCatalog::new(),
            compare_cursor: 0,
            view: None,
            data_failed: false,
            selected_field: 0,
            status: "Fetching locations and metrics...".to_string(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if self.pump() {
                needs_redraw = true;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(EXIT_RUNTIME, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        log::info!("discarded {} stale responses", self.fetcher.stale_count());
        Ok(())
    }

    /// Apply finished fetches. Returns `true` when anything changed.
    fn pump(&mut self) -> bool {
        let outcomes = self.fetcher.poll();
        let changed = !outcomes.is_empty();
        for outcome in outcomes {
            self.apply(outcome);
        }
        changed
    }

    fn apply(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Locations { housing_type, result } => match result {
                Ok(locations) => {
                    log::info!("{} locations for {}", locations.len(), housing_type.as_str());
                    self.locations = locations;
                    self.compare_cursor = 0;
                    self.filters.reconcile_locations(&self.locations);
                    if self.locations.is_empty() {
                        self.status = format!("No locations for {}.", housing_type.display_name());
                    }
                    self.request_data();
                }
                Err(err) => {
                    log::error!("fetching locations failed: {err}");
                    self.locations.clear();
                    self.status = MSG_LOCATIONS_ERROR.to_string();
                }
            },
            FetchOutcome::Metrics(result) => match result {
                Ok(catalog) => {
                    log::info!("{} metrics in catalog", catalog.len());
                    self.catalog = catalog;
                    if !self.catalog.contains_key(&self.filters.metric) {
                        if let Some(first) = self.catalog.keys().next() {
                            self.filters.metric = first.clone();
                            self.request_data();
                        }
                    } else {
                        self.rebuild_view();
                    }
                }
                Err(err) => {
                    log::error!("fetching metrics failed: {err}");
                    self.status = MSG_METRICS_ERROR.to_string();
                }
            },
            FetchOutcome::Data { query, result } => match result {
                Ok(payload) => {
                    self.data_failed = false;
                    self.status = format!(
                        "Loaded {} for {} ({} comparisons)",
                        query.metric,
                        query.location,
                        payload.comparisons.len()
                    );
                    self.view = Some(build_view(payload, &self.filters, &self.catalog));
                }
                Err(err) => {
                    log::error!("fetching data for {} failed: {err}", query.location);
                    self.data_failed = true;
                    self.view = None;
                    self.status = MSG_DATA_ERROR.to_string();
                }
            },
        }
    }

    /// Refetch the payload for the current filters.
    fn request_data(&mut self) {
        if self.filters.location.is_empty() {
            self.fetcher.cancel(FetchFlow::Data);
            self.view = None;
            return;
        }
        match self.filters.to_query() {
            Ok(query) => {
                self.data_failed = false;
                self.fetcher.request_data(query);
                self.status = MSG_LOADING.to_string();
            }
            Err(err) => {
                self.fetcher.cancel(FetchFlow::Data);
                self.view = None;
                self.status = err.message().to_string();
            }
        }
    }

    /// Recompute derived values after a display-only change.
    fn rebuild_view(&mut self) {
        if let Some(view) = self.view.take() {
            self.view = Some(build_view(view.payload, &self.filters, &self.catalog));
        }
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field + 1 < FIELDS.len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => {
                if FIELDS[self.selected_field] == Field::Compare {
                    self.add_comparison();
                }
            }
            KeyCode::Backspace => {
                if let Some(last) = self.filters.compare_locations.last().cloned() {
                    self.filters.remove_comparison(&last);
                    self.request_data();
                }
            }
            KeyCode::Char('c') => self.cycle_chart_mode(),
            KeyCode::Char('i') => self.toggle_inflation(),
            KeyCode::Char('r') => self.request_data(),
            KeyCode::Char('e') => self.export_csv(),
            _ => {}
        }
        false
    }

    fn adjust_field(&mut self, delta: i32) {
        match FIELDS[self.selected_field] {
            Field::HousingType => {
                self.filters.housing_type = if delta >= 0 {
                    self.filters.housing_type.next()
                } else {
                    self.filters.housing_type.prev()
                };
                // Locations differ per property type; wait for the new list.
                self.locations.clear();
                self.view = None;
                self.fetcher.cancel(FetchFlow::Data);
                self.fetcher.request_locations(self.filters.housing_type);
                self.status = "Fetching locations...".to_string();
            }
            Field::Location => {
                if let Some(next) = cycle(&self.locations, &self.filters.location, delta) {
                    self.filters.set_location(&next);
                    self.request_data();
                }
            }
            Field::Compare => {
                if !self.locations.is_empty() {
                    let n = self.locations.len() as i64;
                    let idx = (self.compare_cursor as i64 + delta as i64).rem_euclid(n);
                    self.compare_cursor = idx as usize;
                }
            }
            Field::Metric => {
                let keys: Vec<String> = self.catalog.keys().cloned().collect();
                if let Some(next) = cycle(&keys, &self.filters.metric, delta) {
                    self.filters.metric = next;
                    self.request_data();
                }
            }
            Field::StartYear => {
                // Bounds stay ordered even when the range came in invalid.
                let upper = (self.filters.end_year - 1).clamp(MIN_YEAR, MAX_YEAR);
                let start = (self.filters.start_year + delta).max(MIN_YEAR).min(upper);
                if start != self.filters.start_year {
                    self.filters.start_year = start;
                    self.request_data();
                }
            }
            Field::EndYear => {
                let lower = (self.filters.start_year + 1).clamp(MIN_YEAR, MAX_YEAR);
                let end = (self.filters.end_year + delta).min(MAX_YEAR).max(lower);
                if end != self.filters.end_year {
                    self.filters.end_year = end;
                    self.request_data();
                }
            }
            Field::ChartMode => self.cycle_chart_mode(),
            Field::Inflation => self.toggle_inflation(),
        }
    }

    fn add_comparison(&mut self) {
        let Some(candidate) = self.locations.get(self.compare_cursor).cloned() else {
            return;
        };
        if self.filters.add_comparison(&candidate) {
            self.request_data();
        } else {
            self.status = format!("Cannot add '{candidate}' as a comparison.");
        }
    }

    fn cycle_chart_mode(&mut self) {
        self.filters.chart_mode = self.filters.chart_mode.next();
        self.rebuild_view();
        self.status = format!("chart: {}", self.filters.chart_mode.display_name());
    }

    fn toggle_inflation(&mut self) {
        self.filters.show_inflation = !self.filters.show_inflation;
        self.rebuild_view();
        let state = if self.filters.show_inflation { "on" } else { "off" };
        self.status = format!("inflation overlay: {state}");
    }

    fn export_csv(&mut self) {
        let Some(view) = &self.view else {
            self.status = "Nothing to export.".to_string();
            return;
        };
        let path = crate::io::default_export_path(&view.payload.primary.metric);
        let table = export_table(&view.payload, self.filters.show_inflation);
        self.status = match crate::io::write_chart_csv_file(&path, &table) {
            Ok(()) => format!("Exported {}", path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    /// Text for the chart panel when there is nothing to plot.
    fn placeholder(&self) -> Option<&'static str> {
        if self.fetcher.is_pending(FetchFlow::Data) {
            return Some(MSG_LOADING);
        }
        if self.data_failed {
            return Some(MSG_DATA_ERROR);
        }
        match &self.view {
            Some(view) if !view.table.is_empty() => None,
            _ => Some(MSG_SELECT),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = match (&self.view, self.placeholder()) {
            (Some(view), None) => view.title.clone(),
            _ => "Real Estate Market Analytics".to_string(),
        };
        let lines = vec![
            Line::from(vec![
                Span::styled("estate", Style::default().fg(Color::Cyan)),
                Span::raw(" | "),
                Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
            ]),
            Line::from(Span::styled(
                format!(
                    "{} | {}-{} | {} | source: {}",
                    self.filters.housing_type.display_name(),
                    self.filters.start_year,
                    self.filters.end_year,
                    self.filters.chart_mode.display_name(),
                    self.source_name,
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(44), Constraint::Min(0)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(FIELDS.len() as u16 + 4), Constraint::Min(0)])
            .split(columns[0]);

        self.draw_settings(frame, left[0]);
        self.draw_cards(frame, left[1]);
        self.draw_chart(frame, columns[1]);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let f = &self.filters;
        let dash = || "-".to_string();
        let location = if f.location.is_empty() { dash() } else { f.location.clone() };
        let candidate = self.locations.get(self.compare_cursor).cloned().unwrap_or_else(dash);
        let metric = self
            .catalog
            .get(&f.metric)
            .map(|m| m.description.clone())
            .unwrap_or_else(|| f.metric.clone());

        let items = vec![
            ListItem::new(format!("Property: {}", f.housing_type.display_name())),
            ListItem::new(format!("Location: {location}")),
            ListItem::new(format!("Compare +: {candidate}")),
            ListItem::new(format!("Metric: {metric}")),
            ListItem::new(format!("Start year: {}", f.start_year)),
            ListItem::new(format!("End year: {}", f.end_year)),
            ListItem::new(format!("Chart: {}", f.chart_mode.display_name())),
            ListItem::new(format!("Inflation: {}", if f.show_inflation { "on" } else { "off" })),
        ];
        let compared = if f.compare_locations.is_empty() {
            dash()
        } else {
            f.compare_locations.join(", ")
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .title("Filters")
                    .title_bottom(format!(" comparing: {compared} "))
                    .borders(Borders::ALL),
            )
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_cards(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Summary").borders(Borders::ALL);
        let view = match (&self.view, self.placeholder()) {
            (Some(view), None) => view,
            _ => {
                frame.render_widget(Paragraph::new("").block(block), area);
                return;
            }
        };

        let mut lines = Vec::new();
        for card in &view.cards {
            lines.push(Line::from(Span::styled(card.title, Style::default().fg(Color::Gray))));
            let mut spans = vec![Span::styled(
                format!("  {}", card.formatted_value()),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            if let Some(trend) = card.trend {
                let color = match trend {
                    Trend::Up => Color::Green,
                    Trend::Down => Color::Red,
                    Trend::Neutral => Color::Gray,
                };
                spans.push(Span::styled(format!("  {}", trend.label()), Style::default().fg(color)));
            }
            lines.push(Line::from(spans));
        }

        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Chart").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let view = match (&self.view, self.placeholder()) {
            (Some(view), None) => view,
            (_, message) => {
                let color = if self.data_failed { Color::Red } else { Color::Yellow };
                let msg = Paragraph::new(message.unwrap_or(MSG_SELECT)).style(Style::default().fg(color));
                frame.render_widget(msg, inner);
                return;
            }
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        let data = chart_data(&view.table);
        frame.render_widget(Paragraph::new(legend_line(&data)), rows[0]);

        let unit = view.payload.primary.unit;
        let widget = DashboardChart {
            series: &data.series,
            inflation: data.inflation.as_ref(),
            style: chart_style(self.filters.chart_mode),
            zero_line: view.table.mode == ValueMode::Yoy,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            y_label: y_axis_label(unit, view.table.mode),
            fmt_y: axis_formatter(unit, view.table.mode),
        };
        frame.render_widget(widget, rows[1]);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  Enter add compare  Bksp remove  c chart  i inflation  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Step from `current` to its neighbour in `items`, wrapping around.
fn cycle(items: &[String], current: &str, delta: i32) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let n = items.len() as i64;
    let next = match items.iter().position(|i| i == current) {
        Some(idx) => (idx as i64 + delta as i64).rem_euclid(n),
        None => 0,
    };
    items.get(next as usize).cloned()
}

struct ChartData {
    series: Vec<ChartSeries>,
    inflation: Option<ChartSeries>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build chart series for Plotters: one series per table column, split into
/// segments wherever a row has no value.
fn chart_data(table: &ChartTable) -> ChartData {
    let series: Vec<ChartSeries> = table
        .keys
        .iter()
        .enumerate()
        .map(|(i, key)| ChartSeries {
            label: key.clone(),
            color: palette_color(i),
            segments: segments(table, |row| row.get(key)),
        })
        .collect();
    let inflation = table.show_inflation.then(|| ChartSeries {
        label: INFLATION_KEY.to_string(),
        color: INFLATION_COLOR,
        segments: segments(table, |row| row.inflation),
    });

    let (x0, x1) = match (table.rows.first(), table.rows.last()) {
        (Some(first), Some(last)) => (first.year as f64 - 0.5, last.year as f64 + 0.5),
        _ => (0.0, 1.0),
    };

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for s in series.iter().chain(inflation.iter()) {
        for &(_, y) in s.segments.iter().flatten() {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    } else if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    ChartData {
        series,
        inflation,
        x_bounds: [x0, x1],
        y_bounds: [y_min - pad, y_max + pad],
    }
}

fn segments(
    table: &ChartTable,
    value: impl Fn(&crate::analytics::ChartRow) -> Option<f64>,
) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for row in &table.rows {
        match value(row) {
            Some(v) => current.push((row.year as f64, v)),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn legend_line(data: &ChartData) -> Line<'static> {
    let mut spans = Vec::new();
    for s in data.series.iter().chain(data.inflation.iter()) {
        spans.push(Span::styled("■ ", Style::default().fg(to_ratatui(s.color))));
        spans.push(Span::raw(format!("{}  ", s.label)));
    }
    Line::from(spans)
}

fn chart_style(mode: ChartMode) -> ChartStyle {
    match mode {
        ChartMode::Line | ChartMode::Yoy => ChartStyle::Line,
        ChartMode::Bar => ChartStyle::Bar,
        ChartMode::Area => ChartStyle::Area,
    }
}

fn y_axis_label(unit: Unit, mode: ValueMode) -> &'static str {
    match mode {
        ValueMode::Yoy => "Percentage Change (%)",
        ValueMode::Raw => unit.label(),
    }
}

fn axis_formatter(unit: Unit, mode: ValueMode) -> fn(f64) -> String {
    match (mode, unit) {
        (ValueMode::Yoy, _) | (ValueMode::Raw, Unit::Percentage) => fmt_axis_percent,
        (ValueMode::Raw, Unit::Dollars) => fmt_axis_dollars,
        (ValueMode::Raw, Unit::Ratio) => fmt_axis_ratio,
        (ValueMode::Raw, Unit::Count) => fmt_axis_count,
    }
}

fn fmt_axis_percent(v: f64) -> String {
    format!("{v:.1}%")
}

fn fmt_axis_dollars(v: f64) -> String {
    if v.abs() >= 1_000_000.0 {
        format!("${:.1}M", v / 1_000_000.0)
    } else if v.abs() >= 1_000.0 {
        format!("${:.0}k", v / 1_000.0)
    } else {
        format!("${v:.0}")
    }
}

fn fmt_axis_ratio(v: f64) -> String {
    format!("{v:.2}")
}

fn fmt_axis_count(v: f64) -> String {
    format!("{v:.0}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    use crate::analytics::project;
    use crate::data::DemoSource;
    use crate::domain::{AnalyticsPayload, DataPoint, DataQuery, HousingType, Series};

    /// Demo data with switchable failures per fetch flow.
    struct FlakySource {
        inner: DemoSource,
        fail_locations: AtomicBool,
        fail_data: AtomicBool,
    }

    impl FlakySource {
        fn new() -> Self {
            Self {
                inner: DemoSource::new(9),
                fail_locations: AtomicBool::new(false),
                fail_data: AtomicBool::new(false),
            }
        }
    }

    impl AnalyticsSource for FlakySource {
        fn describe(&self) -> String {
            "flaky".to_string()
        }

        fn fetch_locations(&self, housing_type: HousingType) -> Result<Vec<String>, AppError> {
            if self.fail_locations.load(Ordering::SeqCst) {
                return Err(AppError::runtime("locations unavailable"));
            }
            self.inner.fetch_locations(housing_type)
        }

        fn fetch_metrics(&self) -> Result<MetricCatalog, AppError> {
            self.inner.fetch_metrics()
        }

        fn fetch_payload(&self, query: &DataQuery) -> Result<AnalyticsPayload, AppError> {
            if self.fail_data.load(Ordering::SeqCst) {
                return Err(AppError::runtime("payload unavailable"));
            }
            self.inner.fetch_payload(query)
        }
    }

    fn flaky_app(source: &Arc<FlakySource>) -> App {
        let filters = Filters {
            location: "boston".to_string(),
            ..Filters::default()
        };
        App::new(Fetcher::new(source.clone()), filters)
    }

    fn app() -> App {
        let filters = Filters {
            location: "boston".to_string(),
            ..Filters::default()
        };
        App::new(Fetcher::new(Arc::new(DemoSource::new(9))), filters)
    }

    fn settle(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            app.pump();
            let busy = [FetchFlow::Locations, FetchFlow::Metrics, FetchFlow::Data]
                .iter()
                .any(|f| app.fetcher.is_pending(*f));
            if !busy {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("fetches did not settle");
    }

    fn select(app: &mut App, field: Field) {
        app.selected_field = FIELDS.iter().position(|f| *f == field).unwrap();
    }

    #[test]
    fn startup_loads_locations_metrics_and_data() {
        let mut app = app();
        assert_eq!(app.placeholder(), Some(MSG_SELECT));
        settle(&mut app);

        assert!(!app.locations.is_empty());
        assert!(app.catalog.contains_key("median_price"));
        let view = app.view.as_ref().unwrap();
        assert_eq!(view.payload.primary.location, "boston");
        assert_eq!(view.title, "Median Price in boston");
        assert_eq!(app.placeholder(), None);
    }

    #[test]
    fn adding_and_removing_comparisons_refetches() {
        let mut app = app();
        settle(&mut app);

        select(&mut app, Field::Compare);
        let target = app.locations.iter().position(|l| l == "salem").unwrap();
        app.compare_cursor = target;
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.placeholder(), Some(MSG_LOADING));
        settle(&mut app);
        assert_eq!(app.view.as_ref().unwrap().payload.comparisons.len(), 1);

        app.handle_key(KeyCode::Backspace);
        settle(&mut app);
        assert!(app.filters.compare_locations.is_empty());
        assert!(app.view.as_ref().unwrap().payload.comparisons.is_empty());
    }

    #[test]
    fn display_changes_recompute_without_fetching() {
        let mut app = app();
        settle(&mut app);

        app.handle_key(KeyCode::Char('i'));
        app.handle_key(KeyCode::Char('c'));
        assert!(!app.fetcher.is_pending(FetchFlow::Data));
        let view = app.view.as_ref().unwrap();
        assert!(view.table.show_inflation);
        assert_eq!(app.filters.chart_mode, ChartMode::Bar);
    }

    #[test]
    fn year_range_stays_ordered() {
        let mut app = app();
        settle(&mut app);

        select(&mut app, Field::StartYear);
        for _ in 0..20 {
            app.handle_key(KeyCode::Right);
        }
        assert_eq!(app.filters.start_year, app.filters.end_year - 1);

        select(&mut app, Field::EndYear);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.filters.end_year, app.filters.start_year + 1);
    }

    #[test]
    fn stepping_out_of_range_cli_years_does_not_panic() {
        let filters = Filters {
            location: "boston".to_string(),
            end_year: 1990,
            ..Filters::default()
        };
        let mut app = App::new(Fetcher::new(Arc::new(DemoSource::new(9))), filters);
        settle(&mut app);
        assert!(app.view.is_none());

        select(&mut app, Field::StartYear);
        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.filters.start_year, MIN_YEAR);
        assert!(app.status.contains("outside the supported range"));
        assert!(!app.fetcher.is_pending(FetchFlow::Data));

        // Stepping the end year back into range makes the selection valid again.
        select(&mut app, Field::EndYear);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.filters.end_year, MIN_YEAR + 1);
        settle(&mut app);
        assert!(app.view.is_some());
    }

    #[test]
    fn start_year_past_the_range_steps_without_panicking() {
        let filters = Filters {
            location: "boston".to_string(),
            start_year: 2030,
            ..Filters::default()
        };
        let mut app = App::new(Fetcher::new(Arc::new(DemoSource::new(9))), filters);
        settle(&mut app);

        select(&mut app, Field::EndYear);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.filters.end_year, MAX_YEAR);
        select(&mut app, Field::StartYear);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.filters.start_year, MAX_YEAR - 1);
        settle(&mut app);
        assert!(app.view.is_some());
    }

    #[test]
    fn failed_data_fetch_shows_error_until_next_change() {
        let source = Arc::new(FlakySource::new());
        source.fail_data.store(true, Ordering::SeqCst);
        let mut app = flaky_app(&source);
        settle(&mut app);

        assert!(app.view.is_none());
        assert!(app.data_failed);
        assert_eq!(app.status, MSG_DATA_ERROR);
        assert_eq!(app.placeholder(), Some(MSG_DATA_ERROR));

        // The session keeps running and the next filter change retries.
        source.fail_data.store(false, Ordering::SeqCst);
        select(&mut app, Field::Location);
        app.handle_key(KeyCode::Right);
        assert!(!app.data_failed);
        assert_eq!(app.placeholder(), Some(MSG_LOADING));
        settle(&mut app);

        assert_eq!(app.placeholder(), None);
        let view = app.view.as_ref().unwrap();
        assert_eq!(view.payload.primary.location, app.filters.location);
        assert_ne!(app.filters.location, "boston");
    }

    #[test]
    fn failed_location_fetch_recovers_on_housing_type_change() {
        let source = Arc::new(FlakySource::new());
        source.fail_locations.store(true, Ordering::SeqCst);
        let mut app = flaky_app(&source);
        settle(&mut app);

        assert!(app.locations.is_empty());
        assert!(app.view.is_none());
        assert_eq!(app.status, MSG_LOCATIONS_ERROR);
        assert_eq!(app.placeholder(), Some(MSG_SELECT));

        source.fail_locations.store(false, Ordering::SeqCst);
        select(&mut app, Field::HousingType);
        app.handle_key(KeyCode::Right);
        settle(&mut app);

        assert!(!app.locations.is_empty());
        assert!(app.view.is_some());
    }

    #[test]
    fn failed_metrics_fetch_keeps_the_current_view() {
        let mut app = app();
        settle(&mut app);

        app.apply(FetchOutcome::Metrics(Err(AppError::runtime("metrics unavailable"))));
        assert_eq!(app.status, MSG_METRICS_ERROR);
        assert!(app.view.is_some());
        assert!(app.catalog.contains_key("median_price"));
    }

    #[test]
    fn switching_housing_type_drops_unknown_location() {
        let mut app = app();
        settle(&mut app);
        app.filters.set_location("newton/waban");
        select(&mut app, Field::HousingType);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.filters.housing_type, HousingType::Multifamily);
        assert!(app.view.is_none());

        settle(&mut app);
        // Neighborhoods only exist for condos; the first town is picked instead.
        assert_eq!(app.filters.location, app.locations[0]);
        assert!(app.view.is_some());
    }

    #[test]
    fn cycle_wraps_in_both_directions() {
        let items = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(cycle(&items, "c", 1).as_deref(), Some("a"));
        assert_eq!(cycle(&items, "a", -1).as_deref(), Some("c"));
        assert_eq!(cycle(&items, "zzz", 1).as_deref(), Some("a"));
        assert_eq!(cycle(&[], "a", 1), None);
    }

    #[test]
    fn chart_data_splits_series_at_gaps() {
        let mk = |loc: &str, pts: &[(i32, f64)]| {
            Series::new(
                loc,
                "median_price",
                Unit::Dollars,
                pts.iter().map(|&(y, v)| DataPoint::new(y, v)).collect(),
            )
        };
        let payload = AnalyticsPayload {
            primary: mk("boston", &[(2019, 1.0), (2020, 2.0), (2021, 3.0)]),
            comparisons: vec![mk("salem", &[(2019, 5.0), (2021, 7.0)])],
            metadata: Default::default(),
        };
        let table = project(&payload, ValueMode::Raw, true);
        let data = chart_data(&table);

        assert_eq!(data.series.len(), 2);
        assert_eq!(data.series[0].segments.len(), 1);
        assert_eq!(data.series[1].segments, vec![vec![(2019.0, 5.0)], vec![(2021.0, 7.0)]]);
        assert_eq!(data.series[1].color, plotters_chart::PALETTE[1]);
        assert_eq!(data.inflation.as_ref().map(|s| s.color), Some(INFLATION_COLOR));
        assert_eq!(data.x_bounds, [2018.5, 2021.5]);
        assert!(data.y_bounds[0] < 1.0 && data.y_bounds[1] > 7.0);
    }

    #[test]
    fn axis_labels_follow_unit_and_mode() {
        assert_eq!(y_axis_label(Unit::Dollars, ValueMode::Yoy), "Percentage Change (%)");
        assert_eq!(axis_formatter(Unit::Dollars, ValueMode::Raw)(512_000.0), "$512k");
        assert_eq!(axis_formatter(Unit::Dollars, ValueMode::Yoy)(2.5), "2.5%");
        assert_eq!(axis_formatter(Unit::Count, ValueMode::Raw)(12.4), "12");
    }
}
