//! Dashboard filter state and the selection rules that keep it consistent.

use crate::domain::{ChartMode, DataQuery, HousingType};
use crate::error::AppError;

/// First year the service holds data for.
pub const MIN_YEAR: i32 = 1995;
/// Last year the service accepts in a query.
pub const MAX_YEAR: i32 = 2025;
/// Maximum number of comparison locations overlaid on the primary.
pub const MAX_COMPARISONS: usize = 5;

/// Everything the user can pick on the filter panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub housing_type: HousingType,
    /// Primary location (`town` or `town/neighborhood`). Empty until chosen.
    pub location: String,
    pub compare_locations: Vec<String>,
    pub metric: String,
    pub start_year: i32,
    pub end_year: i32,
    pub chart_mode: ChartMode,
    pub show_inflation: bool,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            housing_type: HousingType::Condos,
            location: String::new(),
            compare_locations: Vec::new(),
            metric: "median_price".to_string(),
            start_year: 2015,
            end_year: 2023,
            chart_mode: ChartMode::Line,
            show_inflation: false,
        }
    }
}

impl Filters {
    /// Add a comparison location.
    ///
    /// Returns `false` (and leaves the list alone) when the list is full, the
    /// location is already present, or it is the primary location.
    pub fn add_comparison(&mut self, location: &str) -> bool {
        if location.is_empty()
            || self.compare_locations.len() >= MAX_COMPARISONS
            || location == self.location
            || self.compare_locations.iter().any(|l| l == location)
        {
            return false;
        }
        self.compare_locations.push(location.to_string());
        true
    }

    pub fn remove_comparison(&mut self, location: &str) -> bool {
        let before = self.compare_locations.len();
        self.compare_locations.retain(|l| l != location);
        self.compare_locations.len() != before
    }

    /// Change the primary location, dropping it from the comparisons if present.
    pub fn set_location(&mut self, location: &str) {
        self.location = location.to_string();
        self.compare_locations.retain(|l| l != location);
    }

    /// Reconcile the selection with a freshly fetched location list.
    ///
    /// Unknown locations are dropped; an empty primary falls back to the
    /// first available location.
    pub fn reconcile_locations(&mut self, available: &[String]) {
        if !available.iter().any(|l| *l == self.location) {
            self.location = available.first().cloned().unwrap_or_default();
        }
        let primary = self.location.clone();
        self.compare_locations
            .retain(|l| *l != primary && available.iter().any(|a| a == l));
    }

    pub fn validate_years(&self) -> Result<(), AppError> {
        for (name, year) in [("start", self.start_year), ("end", self.end_year)] {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(AppError::input(format!(
                    "{name} year {year} is outside the supported range {MIN_YEAR}-{MAX_YEAR}."
                )));
            }
        }
        if self.start_year >= self.end_year {
            return Err(AppError::input(format!(
                "Start year ({}) must be less than end year ({}).",
                self.start_year, self.end_year
            )));
        }
        Ok(())
    }

    /// Build the data request for the current selection.
    pub fn to_query(&self) -> Result<DataQuery, AppError> {
        if self.location.trim().is_empty() {
            return Err(AppError::input("No primary location selected."));
        }
        if self.metric.trim().is_empty() {
            return Err(AppError::input("No metric selected."));
        }
        if self.compare_locations.len() > MAX_COMPARISONS {
            return Err(AppError::input(format!(
                "At most {MAX_COMPARISONS} comparison locations are allowed."
            )));
        }
        self.validate_years()?;

        Ok(DataQuery {
            housing_type: self.housing_type,
            location: self.location.clone(),
            start_year: self.start_year,
            end_year: self.end_year,
            metric: self.metric.clone(),
            compare_locations: self.compare_locations.clone(),
        })
    }
}
