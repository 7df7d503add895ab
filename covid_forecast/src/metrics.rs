//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Values at or below this floor are raised to it before computing MAPE
pub const MAPE_FLOOR: f64 = 1.0;

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::InvalidParameter(format!(
            "Actual length ({}) doesn't match predicted length ({})",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}

/// Mean absolute percentage error.
///
/// Both inputs are clipped so that values `<= 1` count as `1`, which keeps
/// near-zero case counts from exaggerating the percentages. Empty input
/// yields NaN.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let clip = |v: f64| if v <= MAPE_FLOOR { MAPE_FLOOR } else { v };
    let total: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(&a, &p)| {
            let a = clip(a);
            ((a - clip(p)) / a).abs()
        })
        .sum();

    Ok(total / actual.len() as f64 * 100.0)
}

/// Root mean squared error. Empty input yields NaN.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let mse = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;

    Ok(mse.sqrt())
}

/// Accuracy of a model on the test period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    pub mape: f64,
}

impl ForecastMetrics {
    /// Compare test actuals with the model's test-horizon predictions
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        Ok(Self {
            rmse: rmse(actual, predicted)?,
            mape: mape(actual, predicted)?,
        })
    }
}

impl std::fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RMSE: {:.2}, MAPE: {:.2}%", self.rmse, self.mape)
    }
}
