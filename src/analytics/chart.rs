//! Chart data projector.
//!
//! Reshapes the primary series plus its comparisons into one row per year so
//! the chart widgets, the CSV export and the terminal table all consume the
//! same structure. The primary series' years drive the rows: comparison years
//! outside that set are dropped and missing comparison years stay absent.

use std::collections::BTreeMap;

use crate::analytics::stats::yoy_change;
use crate::data::inflation::inflation_for;
use crate::domain::{AnalyticsPayload, ChartMode, Series};

/// Column key of the inflation overlay.
pub const INFLATION_KEY: &str = "inflation";

/// Which values the projected cells carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// The series values as received.
    Raw,
    /// Year-over-year percentage change, keyed as `"<label> YoY"`.
    Yoy,
}

impl ValueMode {
    pub fn for_chart(mode: ChartMode) -> Self {
        if mode.is_yoy() { ValueMode::Yoy } else { ValueMode::Raw }
    }
}

/// Column key for a series label under the given mode.
pub fn series_key(label: &str, mode: ValueMode) -> String {
    match mode {
        ValueMode::Raw => label.to_string(),
        ValueMode::Yoy => format!("{label} YoY"),
    }
}

/// One projected year.
///
/// `cells` keeps the series order of the table (primary first) and carries
/// `None` where a series has no value for this year.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub year: i32,
    pub cells: Vec<(String, Option<f64>)>,
    /// Only populated when the overlay is enabled and the table knows the year.
    pub inflation: Option<f64>,
}

impl ChartRow {
    /// Value stored under `key`; `"inflation"` reads the overlay.
    pub fn get(&self, key: &str) -> Option<f64> {
        if key == INFLATION_KEY {
            return self.inflation;
        }
        self.cells
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| *v)
    }
}

/// Row-per-year projection of a payload, immutable for one render cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartTable {
    pub mode: ValueMode,
    pub show_inflation: bool,
    /// Series keys in display order (primary first).
    pub keys: Vec<String>,
    pub rows: Vec<ChartRow>,
}

impl ChartTable {
    /// Column names for tabular output: `year`, series keys, then `inflation`
    /// when the overlay is on.
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.keys.len() + 2);
        header.push("year".to_string());
        header.extend(self.keys.iter().cloned());
        if self.show_inflation {
            header.push(INFLATION_KEY.to_string());
        }
        header
    }

    /// `(year, value)` pairs for one column, skipping absent cells.
    pub fn column(&self, key: &str) -> Vec<(i32, f64)> {
        self.rows
            .iter()
            .filter_map(|row| row.get(key).map(|v| (row.year, v)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn series_values(series: &Series, mode: ValueMode) -> BTreeMap<i32, f64> {
    match mode {
        ValueMode::Raw => series.points.iter().map(|p| (p.year, p.value)).collect(),
        ValueMode::Yoy => yoy_change(series).map(|p| (p.year, p.percent_change)).collect(),
    }
}

/// Project a payload into chart rows.
pub fn project(payload: &AnalyticsPayload, mode: ValueMode, show_inflation: bool) -> ChartTable {
    let columns: Vec<(String, BTreeMap<i32, f64>)> = payload
        .all_series()
        .map(|s| (series_key(&s.location, mode), series_values(s, mode)))
        .collect();

    let rows = payload
        .primary
        .points
        .iter()
        .map(|anchor| {
            let year = anchor.year;
            let cells = columns
                .iter()
                .map(|(key, values)| (key.clone(), values.get(&year).copied()))
                .collect();
            let inflation = if show_inflation { inflation_for(year) } else { None };
            ChartRow {
                year,
                cells,
                inflation,
            }
        })
        .collect();

    ChartTable {
        mode,
        show_inflation,
        keys: columns.into_iter().map(|(key, _)| key).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataPoint, Unit};

    fn series(location: &str, points: &[(i32, f64)]) -> Series {
        Series::new(
            location,
            "median_price",
            Unit::Dollars,
            points.iter().map(|&(y, v)| DataPoint::new(y, v)).collect(),
        )
    }

    fn payload(primary: Series, comparisons: Vec<Series>) -> AnalyticsPayload {
        AnalyticsPayload {
            primary,
            comparisons,
            metadata: Default::default(),
        }
    }

    #[test]
    fn primary_years_anchor_the_rows() {
        let p = payload(
            series("boston", &[(2019, 10.0), (2020, 11.0), (2021, 12.0)]),
            vec![series("cambridge", &[(2020, 20.0), (2021, 21.0), (2022, 22.0)])],
        );
        let table = project(&p, ValueMode::Raw, false);

        let years: Vec<i32> = table.rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
        assert_eq!(table.keys, vec!["boston".to_string(), "cambridge".to_string()]);
        assert_eq!(table.rows[0].get("boston"), Some(10.0));
        assert_eq!(table.rows[0].get("cambridge"), None);
        assert_eq!(table.rows[2].get("cambridge"), Some(21.0));
        assert!(table.column("cambridge").iter().all(|&(y, _)| y != 2022));
    }

    #[test]
    fn yoy_mode_leaves_first_primary_cell_absent() {
        let p = payload(
            series("boston", &[(2019, 100.0), (2020, 110.0), (2021, 121.0), (2022, 133.1)]),
            Vec::new(),
        );
        let table = project(&p, ValueMode::Yoy, false);

        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.keys, vec!["boston YoY".to_string()]);
        assert_eq!(table.rows[0].get("boston YoY"), None);
        assert_eq!(table.column("boston YoY").len(), 3);
        assert_eq!(table.rows[1].get("boston YoY"), Some(10.0));
    }

    #[test]
    fn yoy_mode_applies_to_comparisons() {
        let p = payload(
            series("boston", &[(2020, 100.0), (2021, 150.0)]),
            vec![series("quincy", &[(2020, 0.0), (2021, 80.0)])],
        );
        let table = project(&p, ValueMode::Yoy, false);
        assert_eq!(table.rows[1].get("boston YoY"), Some(50.0));
        // Transition from zero is skipped, so the cell stays absent.
        assert_eq!(table.rows[1].get("quincy YoY"), None);
    }

    #[test]
    fn inflation_only_when_enabled_and_known() {
        let p = payload(series("boston", &[(2024, 1.0), (2025, 2.0)]), Vec::new());

        let off = project(&p, ValueMode::Raw, false);
        assert!(off.rows.iter().all(|r| r.inflation.is_none()));
        assert_eq!(off.header(), vec!["year".to_string(), "boston".to_string()]);

        let on = project(&p, ValueMode::Raw, true);
        assert_eq!(on.rows[0].get(INFLATION_KEY), Some(2.9));
        assert_eq!(on.rows[1].get(INFLATION_KEY), None);
        assert_eq!(on.header().last().map(String::as_str), Some(INFLATION_KEY));
    }

    #[test]
    fn empty_primary_projects_no_rows() {
        let p = payload(series("boston", &[]), vec![series("salem", &[(2020, 1.0)])]);
        let table = project(&p, ValueMode::Raw, true);
        assert!(table.is_empty());
        assert_eq!(table.keys.len(), 2);
    }

    #[test]
    fn chart_mode_selects_value_mode() {
        assert_eq!(ValueMode::for_chart(ChartMode::Yoy), ValueMode::Yoy);
        assert_eq!(ValueMode::for_chart(ChartMode::Bar), ValueMode::Raw);
    }
}
