//! Derivation engine: summary statistics over yearly series.
//!
//! Every function here is pure and total. Degenerate inputs (empty series,
//! zero denominators) resolve to `0.0` or to skipped elements, never to an
//! error or a non-finite number.

use crate::data::inflation::inflation_in_range;
use crate::domain::{AnalyticsPayload, DerivedStatistics, Series, Trend};

/// Year-over-year percentage change ending at `year`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoyPoint {
    pub year: i32,
    pub percent_change: f64,
}

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Mean value of the series, rounded to 2 decimals. `0.0` when empty.
pub fn average(series: &Series) -> f64 {
    mean(series.points.iter().map(|p| p.value))
        .map(round2)
        .unwrap_or(0.0)
}

/// Smallest value in the series. `0.0` when empty.
pub fn min(series: &Series) -> f64 {
    series
        .points
        .iter()
        .map(|p| p.value)
        .reduce(f64::min)
        .unwrap_or(0.0)
}

/// Largest value in the series. `0.0` when empty.
pub fn max(series: &Series) -> f64 {
    series
        .points
        .iter()
        .map(|p| p.value)
        .reduce(f64::max)
        .unwrap_or(0.0)
}

/// Compare the last point against the first; intermediate values are ignored.
pub fn trend(series: &Series) -> Trend {
    match (series.points.first(), series.points.last()) {
        (Some(first), Some(last)) if series.points.len() >= 2 => {
            if last.value > first.value {
                Trend::Up
            } else if last.value < first.value {
                Trend::Down
            } else {
                Trend::Neutral
            }
        }
        _ => Trend::Neutral,
    }
}

/// Percentage change for each point after the first.
///
/// Transitions from a zero value are skipped. The iterator borrows the series
/// and can be recreated at will; nothing is cached.
pub fn yoy_change(series: &Series) -> impl Iterator<Item = YoyPoint> + '_ {
    series.points.windows(2).filter_map(|w| {
        let (prev, cur) = (w[0], w[1]);
        if prev.value == 0.0 {
            return None;
        }
        Some(YoyPoint {
            year: cur.year,
            percent_change: round2((cur.value - prev.value) / prev.value * 100.0),
        })
    })
}

/// Mean of the YoY changes of the primary and every comparison series, pooled
/// together into one population. `0.0` when no series has a usable transition.
pub fn average_yoy_change(payload: &AnalyticsPayload) -> f64 {
    mean(
        payload
            .all_series()
            .flat_map(yoy_change)
            .map(|p| p.percent_change),
    )
    .map(round2)
    .unwrap_or(0.0)
}

/// Mean published inflation over `[start_year, end_year]`.
///
/// Years missing from the table are skipped; `0.0` when none remain.
pub fn average_inflation(start_year: i32, end_year: i32) -> f64 {
    mean(inflation_in_range(start_year, end_year))
        .map(round2)
        .unwrap_or(0.0)
}

/// Everything the summary cards display for one payload and year range.
pub fn derive_statistics(payload: &AnalyticsPayload, start_year: i32, end_year: i32) -> DerivedStatistics {
    let primary = &payload.primary;
    DerivedStatistics {
        average: average(primary),
        min: min(primary),
        max: max(primary),
        trend: trend(primary),
        average_yoy_change: average_yoy_change(payload),
        average_inflation: average_inflation(start_year, end_year),
    }
}
