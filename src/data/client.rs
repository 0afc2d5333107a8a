//! HTTP client for the remote analytics service.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::data::source::AnalyticsSource;
use crate::domain::{AnalyticsPayload, DataQuery, HousingType, MetricCatalog};
use crate::error::AppError;

/// Environment variable holding the service base URL (also read from `.env`).
pub const BASE_URL_ENV: &str = "ESTATE_API_URL";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

const API_PREFIX: &str = "/api/v1/analytics";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct LocationsResponse {
    locations: Vec<String>,
}

// FastAPI error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Clone)]
pub struct AnalyticsClient {
    client: Client,
    base_url: String,
}

impl AnalyticsClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::input(format!(
                "Invalid analytics API URL '{base_url}' (expected http:// or https://)."
            )));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::runtime(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    /// Build a client from `--api-url`, falling back to the environment and
    /// then to the localhost default.
    pub fn from_env(override_url: Option<&str>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let url = resolve_base_url(override_url, std::env::var(BASE_URL_ENV).ok());
        log::info!("analytics API base URL: {url}");
        Self::new(&url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{API_PREFIX}/{path}", self.base_url)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, AppError> {
        let url = self.endpoint(path);
        log::info!("GET {url} {query:?}");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| AppError::runtime(format!("Request for {what} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp
                .json::<ErrorBody>()
                .ok()
                .map(|b| match b.detail {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .unwrap_or_default();
            let msg = if detail.is_empty() {
                format!("Request for {what} failed with status {status}.")
            } else {
                format!("Request for {what} failed with status {status}: {detail}")
            };
            return Err(AppError::runtime(msg));
        }

        resp.json::<T>()
            .map_err(|e| AppError::runtime(format!("Failed to parse {what} response: {e}")))
    }
}

impl AnalyticsSource for AnalyticsClient {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn fetch_locations(&self, housing_type: HousingType) -> Result<Vec<String>, AppError> {
        let body: LocationsResponse = self.get_json(
            "locations",
            &[("housing_type", housing_type.as_str().to_string())],
            "locations",
        )?;
        log::info!("received {} locations for {}", body.locations.len(), housing_type.as_str());
        Ok(body.locations)
    }

    fn fetch_metrics(&self) -> Result<MetricCatalog, AppError> {
        let catalog: MetricCatalog = self.get_json("metrics", &[], "metrics")?;
        log::info!("received {} metrics", catalog.len());
        Ok(catalog)
    }

    fn fetch_payload(&self, query: &DataQuery) -> Result<AnalyticsPayload, AppError> {
        let payload: AnalyticsPayload = self.get_json("data", &query.query_pairs(), "data")?;
        log::info!(
            "received {} primary points and {} comparison series",
            payload.primary.points.len(),
            payload.comparisons.len()
        );
        if payload.comparisons.len() < query.compare_locations.len() {
            log::warn!(
                "service returned {} of {} requested comparisons",
                payload.comparisons.len(),
                query.compare_locations.len()
            );
        }
        Ok(payload)
    }
}

/// Pick the base URL: explicit flag, then environment, then localhost.
pub fn resolve_base_url(flag: Option<&str>, env: Option<String>) -> String {
    flag.map(str::to_string)
        .or(env)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_precedence() {
        assert_eq!(
            resolve_base_url(Some("http://flag:1"), Some("http://env:2".to_string())),
            "http://flag:1"
        );
        assert_eq!(resolve_base_url(None, Some("http://env:2".to_string())), "http://env:2");
        assert_eq!(resolve_base_url(None, Some("   ".to_string())), DEFAULT_BASE_URL);
        assert_eq!(resolve_base_url(None, None), DEFAULT_BASE_URL);
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = AnalyticsClient::new("https://api.example.com/").unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
        assert_eq!(
            client.endpoint("locations"),
            "https://api.example.com/api/v1/analytics/locations"
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        let err = AnalyticsClient::new("localhost:8000").err().unwrap();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }
}
