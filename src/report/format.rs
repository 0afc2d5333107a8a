//! Formatted terminal output: summary cards, chart title, row tables.
//!
//! We keep formatting code in one place so:
//! - the analytics code stays free of presentation concerns
//! - the CLI and the TUI render values identically

use num_format::{Locale, ToFormattedString};

use crate::analytics::stats::round2;
use crate::analytics::{ChartTable, INFLATION_KEY, ValueMode};
use crate::domain::{DerivedStatistics, MetricCatalog, Trend, Unit};

/// One summary card.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: f64,
    pub unit: Unit,
    pub trend: Option<Trend>,
}

impl MetricCard {
    pub fn formatted_value(&self) -> String {
        format_value(self.value, self.unit)
    }
}

/// The five dashboard cards, in display order.
pub fn summary_cards(stats: &DerivedStatistics, unit: Unit) -> Vec<MetricCard> {
    vec![
        MetricCard {
            title: "Average",
            value: stats.average,
            unit,
            trend: Some(stats.trend),
        },
        MetricCard {
            title: "Minimum",
            value: stats.min,
            unit,
            trend: None,
        },
        MetricCard {
            title: "Maximum",
            value: stats.max,
            unit,
            trend: None,
        },
        MetricCard {
            title: "Avg YoY % Change (Selections)",
            value: stats.average_yoy_change,
            unit: Unit::Percentage,
            trend: Some(Trend::from_sign(stats.average_yoy_change)),
        },
        MetricCard {
            title: "Avg Inflation Rate",
            value: stats.average_inflation,
            unit: Unit::Percentage,
            trend: Some(Trend::Neutral),
        },
    ]
}

/// Render a value the way the dashboard cards do.
///
/// - dollars: `$` prefix with thousands separators
/// - ratio: two decimals
/// - percentage: two decimals and `%`
/// - count: thousands separators
pub fn format_value(value: f64, unit: Unit) -> String {
    match unit {
        Unit::Dollars => {
            let sign = if value < 0.0 { "-" } else { "" };
            format!("{sign}${}", group_thousands(value.abs()))
        }
        Unit::Ratio => format!("{value:.2}"),
        Unit::Percentage => format!("{value:.2}%"),
        Unit::Count => {
            let sign = if value < 0.0 { "-" } else { "" };
            format!("{sign}{}", group_thousands(value.abs()))
        }
    }
}

// Up to two decimals, trailing zeros dropped: 1234.5 -> "1,234.5".
fn group_thousands(value: f64) -> String {
    let rounded = round2(value);
    let whole = rounded.trunc();
    let cents = ((rounded - whole) * 100.0).round() as u64;
    let int_part = (whole as u64).to_formatted_string(&Locale::en);
    match cents {
        0 => int_part,
        c if c % 10 == 0 => format!("{int_part}.{}", c / 10),
        c => format!("{int_part}.{c:02}"),
    }
}

/// `"Median Price in boston (with 2 comparisons)"`.
pub fn chart_title(catalog: &MetricCatalog, metric: &str, location: &str, n_comparisons: usize) -> String {
    let description = catalog
        .get(metric)
        .map(|m| m.description.as_str())
        .unwrap_or(metric);
    let mut title = format!("{description} in {location}");
    match n_comparisons {
        0 => {}
        1 => title.push_str(" (with 1 comparison)"),
        n => title.push_str(&format!(" (with {n} comparisons)")),
    }
    title
}

/// Format the summary cards as a plain-text block.
pub fn format_cards(cards: &[MetricCard]) -> String {
    let mut out = String::new();
    for card in cards {
        let trend = card
            .trend
            .map(|t| format!("  [{}]", t.label()))
            .unwrap_or_default();
        out.push_str(&format!(
            "{:<30} {:>18}{trend}\n",
            card.title,
            card.formatted_value()
        ));
    }
    out
}

/// Format projected rows as an aligned text table.
pub fn format_chart_table(table: &ChartTable, unit: Unit) -> String {
    let value_unit = match table.mode {
        ValueMode::Raw => unit,
        ValueMode::Yoy => Unit::Percentage,
    };
    let header = table.header();
    let width = 16usize;

    let mut out = String::new();
    let mut line = format!("{:<6}", header[0]);
    for name in &header[1..] {
        line.push_str(&format!(" {:>width$}", truncate(name, width)));
    }
    out.push_str(line.trim_end());
    out.push('\n');

    let mut rule = format!("{:-<6}", "");
    for _ in &header[1..] {
        rule.push_str(&format!(" {:-<width$}", ""));
    }
    out.push_str(&rule);
    out.push('\n');

    for row in &table.rows {
        let mut line = format!("{:<6}", row.year);
        for key in &header[1..] {
            let cell_unit = if key == INFLATION_KEY { Unit::Percentage } else { value_unit };
            let cell = row
                .get(key)
                .map(|v| format_value(v, cell_unit))
                .unwrap_or_else(|| "-".to_string());
            line.push_str(&format!(" {cell:>width$}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::project;
    use crate::domain::{AnalyticsPayload, DataPoint, MetricInfo, Series};

    #[test]
    fn values_follow_unit_conventions() {
        assert_eq!(format_value(1234567.0, Unit::Dollars), "$1,234,567");
        assert_eq!(format_value(450123.456, Unit::Dollars), "$450,123.46");
        assert_eq!(format_value(-1500.5, Unit::Dollars), "-$1,500.5");
        assert_eq!(format_value(0.98765, Unit::Ratio), "0.99");
        assert_eq!(format_value(3.5, Unit::Percentage), "3.50%");
        assert_eq!(format_value(12034.0, Unit::Count), "12,034");
    }

    #[test]
    fn cards_carry_trends() {
        let stats = DerivedStatistics {
            average: 10.0,
            min: 5.0,
            max: 15.0,
            trend: Trend::Up,
            average_yoy_change: -1.25,
            average_inflation: 2.0,
        };
        let cards = summary_cards(&stats, Unit::Count);
        assert_eq!(cards.len(), 5);
        assert_eq!(cards[0].trend, Some(Trend::Up));
        assert_eq!(cards[1].trend, None);
        assert_eq!(cards[3].trend, Some(Trend::Down));
        assert_eq!(cards[3].formatted_value(), "-1.25%");
        assert_eq!(cards[4].trend, Some(Trend::Neutral));
    }

    #[test]
    fn title_uses_catalog_description() {
        let mut catalog = MetricCatalog::new();
        catalog.insert(
            "median_price".to_string(),
            MetricInfo {
                description: "Median Price".to_string(),
                unit: Unit::Dollars,
            },
        );
        assert_eq!(chart_title(&catalog, "median_price", "boston", 0), "Median Price in boston");
        assert_eq!(
            chart_title(&catalog, "sp_lp_ratio", "salem", 2),
            "sp_lp_ratio in salem (with 2 comparisons)"
        );
    }

    #[test]
    fn table_marks_absent_cells() {
        let payload = AnalyticsPayload {
            primary: Series::new(
                "boston",
                "total_listings",
                Unit::Count,
                vec![DataPoint::new(2020, 100.0), DataPoint::new(2021, 120.0)],
            ),
            comparisons: Vec::new(),
            metadata: Default::default(),
        };
        let table = project(&payload, ValueMode::Yoy, false);
        let text = format_chart_table(&table, Unit::Count);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("year"));
        assert!(lines[2].ends_with('-'));
        assert!(lines[3].ends_with("20.00%"));
    }
}
