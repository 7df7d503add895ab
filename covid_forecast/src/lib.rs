//! # COVID Forecast
//!
//! Forecasting of cumulative COVID-19 case counts per country or region.
//!
//! ## Features
//!
//! - Loading of wide case count CSV files (one column per region)
//! - Auto-tuned ARIMA forecasting
//! - Holt-Winters exponential smoothing, best of a small grid by AIC
//! - RMSE and clipped MAPE on a held-out test period
//! - Date-indexed, plot-ready tables exported through polars
//!
//! ## Quick Start
//!
//! ```no_run
//! use covid_forecast::{CaseData, ForecastConfig, ForecastReport};
//!
//! let data = CaseData::from_csv("time_series_covid19_confirmed_global.csv")?;
//! let series = data.series("US")?;
//!
//! let report = ForecastReport::build(&series, &ForecastConfig::default())?;
//! println!("{}", report.metrics_text());
//! report.table.write_csv("us_forecast.csv")?;
//! # Ok::<(), covid_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod forecaster;
pub mod metrics;
pub mod models;
pub mod optimization;
pub mod report;
pub mod table;
pub mod utils;

// Re-export commonly used types
pub use crate::config::{Component, ForecastConfig};
pub use crate::data::{CaseData, Region, TimeSeries};
pub use crate::error::{ForecastError, Result};
pub use crate::forecaster::{arima_prediction, hw_prediction, Forecaster, ModelForecast};
pub use crate::metrics::{mape, rmse, ForecastMetrics};
pub use crate::report::ForecastReport;
pub use crate::table::{DatedSeries, ForecastTable};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
