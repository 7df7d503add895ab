//! Utility functions for the covid_forecast crate

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};

/// Split a series into a training prefix and a test suffix.
///
/// The training part holds `round(len * train_ratio)` observations.
pub fn train_test_split(series: &TimeSeries, train_ratio: f64) -> Result<(TimeSeries, TimeSeries)> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Train ratio must be between 0 and 1, got {}",
            train_ratio
        )));
    }

    let train_size = (series.len() as f64 * train_ratio).round() as usize;
    let train = series.slice(0, train_size)?;
    let test = series.slice(train_size, series.len())?;

    Ok((train, test))
}

/// Dates of the `horizon` days following `last`
pub fn future_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as i64).map(|i| last + Duration::days(i)).collect()
}
