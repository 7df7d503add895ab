//! Per-region comparison of the forecasters, ready for plotting

use crate::config::ForecastConfig;
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::forecaster::{ArimaForecaster, Forecaster, HoltWintersForecaster, ModelForecast};
use crate::metrics::ForecastMetrics;
use crate::table::{DatedSeries, ForecastTable};
use crate::utils::train_test_split;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

pub const TRAIN_COLUMN: &str = "Train Data";
pub const TEST_COLUMN: &str = "Test Data";

/// Observed data, both model forecasts and their metrics for one region
#[derive(Debug, Clone)]
pub struct ForecastReport {
    /// Region label
    pub region: String,
    /// Last observed date, where the forecasts start
    pub observed_end: NaiveDate,
    /// Outer join of the observed data and every model column
    pub table: ForecastTable,
    /// Individual model outputs, in the order they were run
    pub models: Vec<ModelForecast>,
}

/// Metrics of every model, keyed by model label
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub region: String,
    pub observed_end: NaiveDate,
    pub models: BTreeMap<String, Option<ForecastMetrics>>,
}

impl ForecastReport {
    /// Run both forecasters on the observed part of `series`
    pub fn build(series: &TimeSeries, config: &ForecastConfig) -> Result<Self> {
        let forecasters: Vec<Box<dyn Forecaster>> = vec![
            Box::new(ArimaForecaster::from_config(config)),
            Box::new(HoltWintersForecaster::from_config(config)),
        ];
        Self::build_with(series, config, &forecasters)
    }

    /// Run the given forecasters on the observed part of `series`
    pub fn build_with(
        series: &TimeSeries,
        config: &ForecastConfig,
        forecasters: &[Box<dyn Forecaster>],
    ) -> Result<Self> {
        config.validate()?;

        let observed = series.after(config.observed_after);
        let observed_end = observed.last_date().ok_or_else(|| {
            ForecastError::Data(format!(
                "No observations for {} after {}",
                series.name(),
                config.observed_after
            ))
        })?;

        let (train, test) = train_test_split(&observed, config.train_ratio)?;
        info!(
            region = series.name(),
            train = train.len(),
            test = test.len(),
            "Building forecast report"
        );

        let mut table = ForecastTable::outer_join(&[
            DatedSeries::new(TRAIN_COLUMN, train.points().collect())?,
            test_column(&train, &test)?,
        ]);

        let mut models = Vec::with_capacity(forecasters.len());
        for forecaster in forecasters {
            let forecast = forecaster.predict(&train, &test)?;
            table = table.merge(&forecast.table());
            models.push(forecast);
        }

        Ok(Self {
            region: series.name().to_string(),
            observed_end,
            table,
            models,
        })
    }

    /// Output of the model with the given label
    pub fn model(&self, label: &str) -> Option<&ModelForecast> {
        self.models.iter().find(|m| m.label == label)
    }

    /// Metrics of every model
    pub fn metrics(&self) -> MetricsSummary {
        MetricsSummary {
            region: self.region.clone(),
            observed_end: self.observed_end,
            models: self
                .models
                .iter()
                .map(|m| (m.label.clone(), m.metrics))
                .collect(),
        }
    }

    /// One line per metric, values rounded to two decimals
    pub fn metrics_text(&self) -> String {
        let mut lines = Vec::new();
        for model in &self.models {
            match &model.metrics {
                Some(m) => {
                    lines.push(format!("{} RMSE: {:.2}", model.label, m.rmse));
                    lines.push(format!("{} MAPE: {:.2}", model.label, m.mape));
                }
                None => lines.push(format!("{}: no test data", model.label)),
            }
        }
        lines.join("\n")
    }
}

/// Test observations led by the last training point so the plotted line connects
fn test_column(train: &TimeSeries, test: &TimeSeries) -> Result<DatedSeries> {
    let mut points: Vec<(NaiveDate, f64)> = train.last_point().into_iter().collect();
    points.extend(test.points().filter(|(d, _)| Some(*d) > train.last_date()));
    if points.len() < 2 {
        return Ok(DatedSeries::empty(TEST_COLUMN));
    }
    DatedSeries::new(TEST_COLUMN, points)
}
