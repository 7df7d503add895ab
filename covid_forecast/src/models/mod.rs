//! Forecasting models for time series data

use crate::error::Result;
use std::fmt::Debug;

/// Residual variance floor so perfectly fitted series keep a finite AIC
pub(crate) const MIN_VARIANCE: f64 = 1e-10;

/// Model fitted to a series of observations
pub trait FittedModel: Debug {
    /// Forecast the `horizon` periods following the fitted observations.
    /// A zero horizon yields an empty forecast.
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>>;

    /// Akaike information criterion of the fit
    fn aic(&self) -> f64;

    /// Number of observations the model was fitted to
    fn n_obs(&self) -> usize;

    /// Description of the fitted model
    fn name(&self) -> String;
}

/// Model specification that can be fitted to a series of observations
pub trait ForecastModel: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedModel;

    /// Fit the model to `values`
    fn fit(&self, values: &[f64]) -> Result<Self::Fitted>;

    /// Description of the specification
    fn name(&self) -> String;
}

pub mod arima;
pub mod auto_arima;
pub mod diff;
pub mod exponential_smoothing;
