//! Evaluation protocol and model search settings

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Shape of a trend or seasonal component in exponential smoothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Additive,
    Multiplicative,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Additive => write!(f, "additive"),
            Component::Multiplicative => write!(f, "multiplicative"),
        }
    }
}

/// Hyperparameter grid searched by the Holt-Winters forecaster.
///
/// `None` in `seasonal` or `trend` means the component is left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoltWintersGrid {
    pub seasonal: Vec<Option<Component>>,
    pub trend: Vec<Option<Component>>,
    pub seasonal_periods: Vec<usize>,
}

impl Default for HoltWintersGrid {
    fn default() -> Self {
        let components = vec![
            None,
            Some(Component::Additive),
            Some(Component::Multiplicative),
        ];
        Self {
            seasonal: components.clone(),
            trend: components,
            seasonal_periods: vec![7, 15, 30, 90],
        }
    }
}

/// Search limits for automatic ARIMA order selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArimaSearch {
    /// Maximum AR order
    pub max_p: usize,
    /// Maximum differencing order
    pub max_d: usize,
    /// Maximum MA order
    pub max_q: usize,
    /// Shortest training series accepted
    pub min_observations: usize,
}

impl Default for ArimaSearch {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_d: 2,
            max_q: 3,
            min_observations: 10,
        }
    }
}

/// Settings shared by the forecasters and the report builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Periods forecast beyond the last observed date
    pub forecast_horizon: usize,
    /// Share of observations used for training
    pub train_ratio: f64,
    /// Only observations strictly after this date are modelled
    pub observed_after: NaiveDate,
    pub holt_winters: HoltWintersGrid,
    pub arima: ArimaSearch,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            forecast_horizon: 15,
            train_ratio: 0.8,
            observed_after: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap_or_default(),
            holt_winters: HoltWintersGrid::default(),
            arima: ArimaSearch::default(),
        }
    }
}

impl ForecastConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: ForecastConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the forecast horizon
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.forecast_horizon = horizon;
        self
    }

    /// Set the train ratio
    pub fn with_train_ratio(mut self, ratio: f64) -> Self {
        self.train_ratio = ratio;
        self
    }

    /// Replace the Holt-Winters grid
    pub fn with_grid(mut self, grid: HoltWintersGrid) -> Self {
        self.holt_winters = grid;
        self
    }

    /// Check that the settings describe a usable protocol
    pub fn validate(&self) -> Result<()> {
        if self.forecast_horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be positive".to_string(),
            ));
        }
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Train ratio must be between 0 and 1, got {}",
                self.train_ratio
            )));
        }
        let grid = &self.holt_winters;
        if grid.seasonal.is_empty() || grid.trend.is_empty() || grid.seasonal_periods.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Holt-Winters grid must not be empty".to_string(),
            ));
        }
        if let Some(period) = grid.seasonal_periods.iter().find(|&&p| p < 2) {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2, got {}",
                period
            )));
        }
        Ok(())
    }
}
