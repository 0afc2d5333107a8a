//! Shared domain types.
//!
//! These types mirror the Remote Analytics Service wire format closely so a
//! payload can be:
//!
//! - decoded straight from the HTTP response
//! - handed to the derivation engine and chart projector without copying

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

/// One observation of a yearly series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub year: i32,
    pub value: f64,
}

impl DataPoint {
    pub fn new(year: i32, value: f64) -> Self {
        Self { year, value }
    }
}

/// Measurement unit reported for a metric.
///
/// The service also reports units such as `days` or `listings`; anything that
/// is not one of the first three is treated as a plain count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Dollars,
    Ratio,
    Percentage,
    #[default]
    #[serde(other)]
    Count,
}

impl Unit {
    pub fn label(self) -> &'static str {
        match self {
            Unit::Dollars => "dollars",
            Unit::Ratio => "ratio",
            Unit::Percentage => "percentage",
            Unit::Count => "count",
        }
    }
}

// `unit` is optional on the wire and may be `null`.
fn unit_or_count<'de, D>(deserializer: D) -> Result<Unit, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Unit>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single location's time series for one metric.
///
/// Points are ordered by ascending year with at most one point per year. A
/// series is never mutated after it is received; refetches replace it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub location: String,
    pub metric: String,
    #[serde(default, deserialize_with = "unit_or_count")]
    pub unit: Unit,
    #[serde(rename = "data")]
    pub points: Vec<DataPoint>,
}

impl Series {
    pub fn new(
        location: impl Into<String>,
        metric: impl Into<String>,
        unit: Unit,
        points: Vec<DataPoint>,
    ) -> Self {
        Self {
            location: location.into(),
            metric: metric.into(),
            unit,
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Response of the `/analytics/data` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsPayload {
    pub primary: Series,
    #[serde(default)]
    pub comparisons: Vec<Series>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl AnalyticsPayload {
    /// Primary series first, then comparisons in request order.
    pub fn all_series(&self) -> impl Iterator<Item = &Series> {
        std::iter::once(&self.primary).chain(self.comparisons.iter())
    }
}

/// Direction of a series between its first and last point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Trend::Up
        } else if value < 0.0 {
            Trend::Down
        } else {
            Trend::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Trend::Up => "Increasing",
            Trend::Down => "Decreasing",
            Trend::Neutral => "Stable",
        }
    }
}

/// Statistics shown on the summary cards. Recomputed on every payload change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedStatistics {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub trend: Trend,
    pub average_yoy_change: f64,
    pub average_inflation: f64,
}

/// Property type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HousingType {
    Condos,
    Multifamily,
    Singlefamily,
}

impl HousingType {
    pub const ALL: [HousingType; 3] = [
        HousingType::Condos,
        HousingType::Multifamily,
        HousingType::Singlefamily,
    ];

    /// Value sent as the `housing_type` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            HousingType::Condos => "condos",
            HousingType::Multifamily => "multifamily",
            HousingType::Singlefamily => "singlefamily",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            HousingType::Condos => "Condos",
            HousingType::Multifamily => "Multi-Family",
            HousingType::Singlefamily => "Single Family",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|h| *h == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|h| *h == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// How the chart draws the projected rows.
///
/// `Yoy` also switches the projector to year-over-year values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartMode {
    Line,
    Bar,
    Area,
    Yoy,
}

impl ChartMode {
    pub fn is_yoy(self) -> bool {
        self == ChartMode::Yoy
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ChartMode::Line => "Line Chart",
            ChartMode::Bar => "Bar Chart",
            ChartMode::Area => "Area Chart",
            ChartMode::Yoy => "Year-over-Year % Change",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ChartMode::Line => ChartMode::Bar,
            ChartMode::Bar => ChartMode::Area,
            ChartMode::Area => ChartMode::Yoy,
            ChartMode::Yoy => ChartMode::Line,
        }
    }
}

/// Catalog entry returned by the `/analytics/metrics` endpoint.
///
/// Extra fields the service may add are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricInfo {
    pub description: String,
    #[serde(default, deserialize_with = "unit_or_count")]
    pub unit: Unit,
}

/// Metric key -> info, iterated in key order.
pub type MetricCatalog = BTreeMap<String, MetricInfo>;

/// Fully validated parameters for one `/analytics/data` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQuery {
    pub housing_type: HousingType,
    pub location: String,
    pub start_year: i32,
    pub end_year: i32,
    pub metric: String,
    pub compare_locations: Vec<String>,
}

impl DataQuery {
    /// Query-string pairs in the order the service documents them.
    ///
    /// `compare_locations` is comma-joined and omitted when empty.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("housing_type", self.housing_type.as_str().to_string()),
            ("location", self.location.clone()),
            ("start_year", self.start_year.to_string()),
            ("end_year", self.end_year.to_string()),
            ("metric", self.metric.clone()),
        ];
        if !self.compare_locations.is_empty() {
            pairs.push(("compare_locations", self.compare_locations.join(",")));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_payload_with_unknown_and_missing_units() {
        let raw = r#"{
            "primary": {
                "location": "boston",
                "metric": "avg_days_on_market",
                "unit": "days",
                "data": [{"year": 2020, "value": 31}, {"year": 2021, "value": 27.5}]
            },
            "comparisons": [
                {"location": "cambridge", "metric": "avg_days_on_market", "unit": null, "data": []},
                {"location": "quincy", "metric": "avg_days_on_market", "data": []}
            ],
            "metadata": {"housing_type": "condos"}
        }"#;

        let payload: AnalyticsPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.primary.unit, Unit::Count);
        assert_eq!(payload.primary.points[1], DataPoint::new(2021, 27.5));
        assert_eq!(payload.comparisons.len(), 2);
        assert!(payload.comparisons.iter().all(|s| s.unit == Unit::Count));
        assert_eq!(
            payload.metadata.get("housing_type"),
            Some(&serde_json::Value::String("condos".to_string()))
        );
    }

    #[test]
    fn decodes_payload_without_comparisons_or_metadata() {
        let raw = r#"{"primary": {"location": "salem", "metric": "median_price",
            "unit": "dollars", "data": [{"year": 2019, "value": 410000}]}}"#;
        let payload: AnalyticsPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.primary.unit, Unit::Dollars);
        assert!(payload.comparisons.is_empty());
        assert!(payload.metadata.is_empty());
        assert_eq!(payload.all_series().count(), 1);
    }

    #[test]
    fn decodes_metric_catalog_ignoring_extra_fields() {
        let raw = r#"{
            "sp_lp_ratio": {"description": "Sp Lp Ratio", "unit": "ratio"},
            "median_price": {"description": "Median Price", "unit": "dollars", "column": "median_price"}
        }"#;
        let catalog: MetricCatalog = serde_json::from_str(raw).unwrap();
        let keys: Vec<&str> = catalog.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["median_price", "sp_lp_ratio"]);
        assert_eq!(catalog["sp_lp_ratio"].unit, Unit::Ratio);
    }

    #[test]
    fn query_pairs_omit_empty_comparisons() {
        let mut query = DataQuery {
            housing_type: HousingType::Singlefamily,
            location: "newton/waban".to_string(),
            start_year: 2015,
            end_year: 2023,
            metric: "median_price".to_string(),
            compare_locations: Vec::new(),
        };
        let pairs = query.query_pairs();
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs[0], ("housing_type", "singlefamily".to_string()));

        query.compare_locations = vec!["brookline".to_string(), "newton".to_string()];
        let pairs = query.query_pairs();
        assert_eq!(pairs.last().unwrap(), &("compare_locations", "brookline,newton".to_string()));
    }

    #[test]
    fn housing_type_cycles_both_ways() {
        assert_eq!(HousingType::Condos.next(), HousingType::Multifamily);
        assert_eq!(HousingType::Condos.prev(), HousingType::Singlefamily);
        assert_eq!(HousingType::Singlefamily.next(), HousingType::Condos);
    }

    #[test]
    fn trend_from_sign() {
        assert_eq!(Trend::from_sign(0.5), Trend::Up);
        assert_eq!(Trend::from_sign(-0.01), Trend::Down);
        assert_eq!(Trend::from_sign(0.0), Trend::Neutral);
    }
}
