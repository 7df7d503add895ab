//! Train/test forecasting with ARIMA and Holt-Winters models
//!
//! Both forecasters follow the same protocol. The model is fitted on the
//! training series and forecasts the test period; that forecast is anchored
//! on the last training observation so plotted curves connect. The model is
//! then brought up to date with the test observations and forecasts a fixed
//! horizon past the last observed date, anchored on the last observation.
//! Accuracy is measured on the test period only.

use crate::config::{ArimaSearch, Component, ForecastConfig, HoltWintersGrid};
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::metrics::ForecastMetrics;
use crate::models::arima::ArimaModel;
use crate::models::auto_arima::AutoArima;
use crate::models::exponential_smoothing::{ExponentialSmoothing, FittedExponentialSmoothing};
use crate::models::{FittedModel, ForecastModel};
use crate::table::{DatedSeries, ForecastTable};
use crate::utils::future_dates;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// The model a forecaster settled on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectedModel {
    Arima(ArimaModel),
    HoltWinters(ExponentialSmoothing),
}

impl SelectedModel {
    /// Description of the model
    pub fn name(&self) -> String {
        match self {
            SelectedModel::Arima(model) => model.name(),
            SelectedModel::HoltWinters(model) => model.name(),
        }
    }
}

/// Output of one forecaster for one series
#[derive(Debug, Clone)]
pub struct ModelForecast {
    /// Short model family label used in column names
    pub label: String,
    /// The model chosen on the training data
    pub selected: SelectedModel,
    /// Test-period forecast, led by the last training observation
    pub test: DatedSeries,
    /// Forecast past the observed data, led by the last observation
    pub forecast: DatedSeries,
    /// Accuracy on the test period, absent when there was no test data
    pub metrics: Option<ForecastMetrics>,
}

impl ModelForecast {
    /// Test and forecast segments joined on date
    pub fn table(&self) -> ForecastTable {
        ForecastTable::outer_join(&[self.test.clone(), self.forecast.clone()])
    }

    /// Test-period predictions without the anchoring point
    pub fn test_predictions(&self) -> Vec<f64> {
        self.test.values().into_iter().skip(1).collect()
    }
}

/// Common interface of the train/test forecasters
pub trait Forecaster {
    /// Model family label, e.g. `"ARIMA"`
    fn label(&self) -> &str;

    /// Fit on `train`, evaluate on `test` and forecast past both
    fn predict(&self, train: &TimeSeries, test: &TimeSeries) -> Result<ModelForecast>;
}

/// Auto-tuned ARIMA forecaster
#[derive(Debug, Clone)]
pub struct ArimaForecaster {
    search: ArimaSearch,
    horizon: usize,
}

impl ArimaForecaster {
    pub fn new(search: ArimaSearch, horizon: usize) -> Self {
        Self { search, horizon }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(config.arima.clone(), config.forecast_horizon)
    }
}

/// Best-of-grid Holt-Winters forecaster
#[derive(Debug, Clone)]
pub struct HoltWintersForecaster {
    grid: HoltWintersGrid,
    horizon: usize,
}

impl HoltWintersForecaster {
    pub fn new(grid: HoltWintersGrid, horizon: usize) -> Self {
        Self { grid, horizon }
    }

    pub fn from_config(config: &ForecastConfig) -> Self {
        Self::new(config.holt_winters.clone(), config.forecast_horizon)
    }
}

/// Observations shared by both forecasters
struct Observed<'a> {
    /// Test values dated after the training data
    test: &'a [f64],
    /// Training and test data as one series
    full: TimeSeries,
    /// Last training observation
    train_end: (NaiveDate, f64),
    /// Last observation overall
    observed_end: (NaiveDate, f64),
}

impl<'a> Observed<'a> {
    fn new(train: &TimeSeries, test: &'a TimeSeries) -> Result<Self> {
        let train_end = train
            .last_point()
            .ok_or(ForecastError::InsufficientData { needed: 1, got: 0 })?;
        let full = train.extended_with(test)?;
        let observed_end = full
            .last_point()
            .ok_or(ForecastError::InsufficientData { needed: 1, got: 0 })?;

        Ok(Self {
            test: train.continuation(test),
            full,
            train_end,
            observed_end,
        })
    }

    /// Forecast over the test period; the model is not consulted without test data
    fn test_forecast<M: FittedModel>(&self, fitted: &M) -> Result<Vec<f64>> {
        if self.test.is_empty() {
            return Ok(Vec::new());
        }
        fitted.forecast(self.test.len())
    }
}

/// Prefix `values`, dated from the day after `anchor`, with the anchor itself
fn anchored(name: String, anchor: (NaiveDate, f64), values: &[f64]) -> Result<DatedSeries> {
    let mut points = vec![anchor];
    points.extend(future_dates(anchor.0, values.len()).into_iter().zip(values.iter().copied()));
    DatedSeries::new(name, points)
}

/// Assemble the output segments and metrics from raw predictions
fn assemble(
    label: &str,
    selected: SelectedModel,
    observed: &Observed<'_>,
    test_predictions: &[f64],
    future: &[f64],
) -> Result<ModelForecast> {
    let test_name = format!("{} - Test", label);
    let (test, metrics) = if observed.test.is_empty() {
        (DatedSeries::empty(test_name), None)
    } else {
        (
            anchored(test_name, observed.train_end, test_predictions)?,
            Some(ForecastMetrics::evaluate(observed.test, test_predictions)?),
        )
    };
    let forecast = anchored(format!("{} - Forecast", label), observed.observed_end, future)?;

    Ok(ModelForecast {
        label: label.to_string(),
        selected,
        test,
        forecast,
        metrics,
    })
}

impl Forecaster for ArimaForecaster {
    fn label(&self) -> &str {
        "ARIMA"
    }

    fn predict(&self, train: &TimeSeries, test: &TimeSeries) -> Result<ModelForecast> {
        let observed = Observed::new(train, test)?;

        let fitted = AutoArima::new(self.search.clone()).fit(train.values())?;
        debug!(
            model = %fitted.name(),
            aic = fitted.aic(),
            intercept = fitted.intercept(),
            variance = fitted.variance(),
            "ARIMA order selected"
        );

        let test_predictions = observed.test_forecast(&fitted)?;
        let updated = fitted.update(observed.test)?;
        let future = updated.forecast(self.horizon)?;

        let result = assemble(
            self.label(),
            SelectedModel::Arima(fitted.spec()),
            &observed,
            &test_predictions,
            &future,
        )?;
        info!("ARIMA model built for {}.", train.name());
        Ok(result)
    }
}

/// Every combination of the grid, in seasonal × trend × period order.
/// Multiplicative components are left out unless `allow_multiplicative`.
pub fn holt_winters_candidates(
    grid: &HoltWintersGrid,
    allow_multiplicative: bool,
) -> Vec<ExponentialSmoothing> {
    let keep = |c: &&Option<Component>| allow_multiplicative || **c != Some(Component::Multiplicative);

    let mut candidates = Vec::new();
    for seasonal in grid.seasonal.iter().filter(keep) {
        for trend in grid.trend.iter().filter(keep) {
            for &period in &grid.seasonal_periods {
                match ExponentialSmoothing::new(*trend, *seasonal, period) {
                    Ok(model) => candidates.push(model),
                    Err(err) => warn!(error = %err, "Skipping Holt-Winters grid entry"),
                }
            }
        }
    }
    candidates
}

/// Fit every candidate and keep the lowest AIC; the first wins ties
fn best_by_aic(
    candidates: &[ExponentialSmoothing],
    values: &[f64],
) -> Result<FittedExponentialSmoothing> {
    let mut best: Option<FittedExponentialSmoothing> = None;
    for candidate in candidates {
        match candidate.fit(values) {
            Ok(fitted) => {
                debug!(model = %candidate.name(), aic = fitted.aic(), "Holt-Winters candidate fitted");
                if best.as_ref().map_or(true, |b| fitted.aic() < b.aic()) {
                    best = Some(fitted);
                }
            }
            Err(err) => debug!(model = %candidate.name(), error = %err, "Holt-Winters candidate failed"),
        }
    }

    best.ok_or_else(|| {
        ForecastError::ModelFit(format!(
            "None of {} Holt-Winters configurations could be fitted to {} observations",
            candidates.len(),
            values.len()
        ))
    })
}

impl Forecaster for HoltWintersForecaster {
    fn label(&self) -> &str {
        "Holt-Winters"
    }

    fn predict(&self, train: &TimeSeries, test: &TimeSeries) -> Result<ModelForecast> {
        let observed = Observed::new(train, test)?;

        // multiplicative fitting is undefined for zero or negative values
        let allow_multiplicative = !(train.has_non_positive() || test.has_non_positive());
        let candidates = holt_winters_candidates(&self.grid, allow_multiplicative);

        let best = best_by_aic(&candidates, train.values())?;
        debug!(
            model = %best.name(),
            aic = best.aic(),
            alpha = best.alpha(),
            beta = ?best.beta(),
            gamma = ?best.gamma(),
            sse = best.sse(),
            "Holt-Winters configuration selected"
        );
        let test_predictions = observed.test_forecast(&best)?;

        let latest = best.spec().fit(observed.full.values())?;
        let future = latest.forecast(self.horizon)?;

        let result = assemble(
            self.label(),
            SelectedModel::HoltWinters(best.spec()),
            &observed,
            &test_predictions,
            &future,
        )?;
        info!("Holt-Winter model built for {}.", train.name());
        Ok(result)
    }
}

/// Forecast with an auto-tuned ARIMA model
pub fn arima_prediction(
    train: &TimeSeries,
    test: &TimeSeries,
    config: &ForecastConfig,
) -> Result<ModelForecast> {
    ArimaForecaster::from_config(config).predict(train, test)
}

/// Forecast with the best Holt-Winters model of the configured grid
pub fn hw_prediction(
    train: &TimeSeries,
    test: &TimeSeries,
    config: &ForecastConfig,
) -> Result<ModelForecast> {
    HoltWintersForecaster::from_config(config).predict(train, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fitted model that refuses an empty horizon
    #[derive(Debug)]
    struct NonEmptyHorizon;

    impl FittedModel for NonEmptyHorizon {
        fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
            if horizon == 0 {
                return Err(ForecastError::InvalidParameter("empty horizon".to_string()));
            }
            Ok(vec![1.0; horizon])
        }

        fn aic(&self) -> f64 {
            0.0
        }

        fn n_obs(&self) -> usize {
            0
        }

        fn name(&self) -> String {
            "NonEmptyHorizon".to_string()
        }
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, 1).unwrap()
    }

    #[test]
    fn empty_test_skips_model_forecast() {
        let train = TimeSeries::from_start("x", start(), vec![1.0, 2.0, 3.0]);
        let test = TimeSeries::from_start("x", start() + chrono::Duration::days(3), vec![]);
        let observed = Observed::new(&train, &test).unwrap();

        assert!(observed.test_forecast(&NonEmptyHorizon).unwrap().is_empty());
        assert_eq!(observed.observed_end, (start() + chrono::Duration::days(2), 3.0));
    }

    #[test]
    fn test_forecast_covers_new_observations() {
        let train = TimeSeries::from_start("x", start(), vec![1.0, 2.0, 3.0]);
        // leading point repeats the last training day
        let test = TimeSeries::from_start("x", start() + chrono::Duration::days(2), vec![3.0, 4.0, 5.0]);
        let observed = Observed::new(&train, &test).unwrap();

        assert_eq!(observed.test, &[4.0, 5.0]);
        assert_eq!(observed.test_forecast(&NonEmptyHorizon).unwrap(), vec![1.0, 1.0]);
    }
}
