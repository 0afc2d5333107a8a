//! Offline demo source with synthetic, deterministic market data.
//!
//! Mirrors the shape of the real service (same metric catalog, same payload
//! layout) so the dashboard can be exercised without a backend.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::analytics::stats::round2;
use crate::data::source::AnalyticsSource;
use crate::domain::{
    AnalyticsPayload, DataPoint, DataQuery, HousingType, MetricCatalog, MetricInfo, Series, Unit,
};
use crate::error::AppError;

/// Metric key and unit, as the service publishes them.
const METRICS: &[(&str, Unit)] = &[
    ("total_listings", Unit::Count),
    ("avg_days_on_market", Unit::Count),
    ("avg_days_to_offer", Unit::Count),
    ("average_sale_price", Unit::Dollars),
    ("average_list_price", Unit::Dollars),
    ("sp_lp_ratio", Unit::Ratio),
    ("average_orig_price", Unit::Dollars),
    ("sp_op_ratio", Unit::Ratio),
    ("lowest_price", Unit::Dollars),
    ("highest_price", Unit::Dollars),
    ("median_price", Unit::Dollars),
    ("total_market_volume", Unit::Dollars),
];

const TOWNS: &[&str] = &[
    "boston",
    "boston/back bay",
    "boston/south end",
    "brookline",
    "cambridge",
    "newton",
    "newton/waban",
    "quincy",
    "salem",
    "somerville",
    "worcester",
];

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

fn fnv1a(hash: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(hash, |h, &b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}

pub struct DemoSource {
    seed: u64,
}

impl DemoSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn locations(&self, housing_type: HousingType) -> Vec<String> {
        // Neighborhood-level rows only exist for condos.
        TOWNS
            .iter()
            .filter(|t| housing_type == HousingType::Condos || !t.contains('/'))
            .map(|t| t.to_string())
            .collect()
    }

    /// Stable per-series seed: FNV-1a over the query fields, each terminated
    /// by `0xff` so adjacent strings cannot run together.
    fn series_seed(&self, query: &DataQuery, location: &str) -> u64 {
        let fields: [&[u8]; 6] = [
            &self.seed.to_le_bytes(),
            query.housing_type.as_str().as_bytes(),
            location.as_bytes(),
            query.metric.as_bytes(),
            &query.start_year.to_le_bytes(),
            &query.end_year.to_le_bytes(),
        ];
        fields
            .iter()
            .fold(FNV_OFFSET, |hash, field| fnv1a(fnv1a(hash, field), &[0xff]))
    }

    fn generate_series(&self, query: &DataQuery, location: &str, unit: Unit) -> Result<Series, AppError> {
        if !self.locations(query.housing_type).iter().any(|l| l == location) {
            return Err(AppError::runtime(format!(
                "No data found for {location} ({}) from {} to {}.",
                query.housing_type.as_str(),
                query.start_year,
                query.end_year
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.series_seed(query, location));
        let points = generate_points(&mut rng, &query.metric, query.start_year, query.end_year);
        Ok(Series::new(location, query.metric.clone(), unit, points))
    }
}

impl AnalyticsSource for DemoSource {
    fn describe(&self) -> String {
        format!("demo data (seed {})", self.seed)
    }

    fn fetch_locations(&self, housing_type: HousingType) -> Result<Vec<String>, AppError> {
        Ok(self.locations(housing_type))
    }

    fn fetch_metrics(&self) -> Result<MetricCatalog, AppError> {
        Ok(METRICS
            .iter()
            .map(|&(key, unit)| {
                let info = MetricInfo {
                    description: describe_metric(key),
                    unit,
                };
                (key.to_string(), info)
            })
            .collect())
    }

    fn fetch_payload(&self, query: &DataQuery) -> Result<AnalyticsPayload, AppError> {
        let unit = METRICS
            .iter()
            .find(|(key, _)| *key == query.metric)
            .map(|&(_, unit)| unit)
            .ok_or_else(|| AppError::runtime(format!("Invalid metric: {}", query.metric)))?;

        let primary = self.generate_series(query, &query.location, unit)?;

        let mut comparisons = Vec::with_capacity(query.compare_locations.len());
        for location in &query.compare_locations {
            match self.generate_series(query, location, unit) {
                Ok(series) => comparisons.push(series),
                Err(err) => log::warn!("skipping comparison {location}: {err}"),
            }
        }

        let mut metadata = std::collections::BTreeMap::new();
        metadata.insert(
            "housing_type".to_string(),
            serde_json::Value::String(query.housing_type.as_str().to_string()),
        );
        metadata.insert("is_dummy_data".to_string(), serde_json::Value::Bool(true));

        Ok(AnalyticsPayload {
            primary,
            comparisons,
            metadata,
        })
    }
}

/// `"avg_days_on_market"` -> `"Avg Days On Market"`.
pub fn describe_metric(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Level and noise amplitude typical for a metric.
fn metric_profile(rng: &mut StdRng, metric: &str) -> (f64, f64) {
    if metric.contains("days") {
        (rng.gen_range(20..=40) as f64, 10.0)
    } else if metric.ends_with("_ratio") {
        (0.95 + rng.r#gen::<f64>() * 0.1, 0.05)
    } else if metric.contains("price") {
        (rng.gen_range(300_000..=600_000) as f64, 50_000.0)
    } else if metric == "total_listings" {
        (rng.gen_range(50..=200) as f64, 30.0)
    } else if metric == "total_market_volume" {
        (rng.gen_range(5_000_000..=20_000_000) as f64, 2_000_000.0)
    } else {
        (100.0, 20.0)
    }
}

fn generate_points(rng: &mut StdRng, metric: &str, start_year: i32, end_year: i32) -> Vec<DataPoint> {
    let (base, variation) = metric_profile(rng, metric);
    let direction = if rng.r#gen::<bool>() { 1.0 } else { -1.0 };
    let trend_factor = direction * rng.r#gen::<f64>() * 0.1;
    let floor_at_one = metric.contains("price") || metric.contains("total") || metric.contains("days");
    let span = (end_year - start_year).max(1) as f64;

    (start_year..=end_year)
        .map(|year| {
            let progress = (year - start_year) as f64 / span;
            let noise = (rng.r#gen::<f64>() * 2.0 - 1.0) * variation;
            let mut value = base * (1.0 + trend_factor * progress) + noise;
            if floor_at_one {
                value = value.max(1.0);
            }
            DataPoint::new(year, round2(value))
        })
        .collect()
}
