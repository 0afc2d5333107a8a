use crate::domain::{AnalyticsPayload, DataQuery, HousingType, MetricCatalog};
use crate::error::AppError;

/// Where the dashboard gets its data from.
///
/// Implemented by the HTTP client and by the offline demo generator. Sources
/// are shared with background fetch jobs, hence `Send + Sync`.
pub trait AnalyticsSource: Send + Sync {
    /// Human-readable origin shown in headers and logs.
    fn describe(&self) -> String;

    fn fetch_locations(&self, housing_type: HousingType) -> Result<Vec<String>, AppError>;

    fn fetch_metrics(&self) -> Result<MetricCatalog, AppError>;

    fn fetch_payload(&self, query: &DataQuery) -> Result<AnalyticsPayload, AppError>;
}
