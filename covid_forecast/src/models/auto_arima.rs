//! Automatic ARIMA order selection

use crate::config::ArimaSearch;
use crate::error::{ForecastError, Result};
use crate::models::arima::{ArimaModel, FittedArima};
use crate::models::diff::suggest_differencing;
use crate::models::{FittedModel, ForecastModel};
use tracing::debug;

/// Searches ARIMA orders and keeps the fit with the lowest AIC
#[derive(Debug, Clone, Default)]
pub struct AutoArima {
    search: ArimaSearch,
}

impl AutoArima {
    /// Create a search with the given limits
    pub fn new(search: ArimaSearch) -> Self {
        Self { search }
    }

    /// Candidate orders for `values`: every `(p, q)` within the limits at the
    /// suggested differencing order. AIC is only comparable at a fixed `d`.
    pub fn candidates(&self, values: &[f64]) -> Vec<ArimaModel> {
        let d = suggest_differencing(values, self.search.max_d);

        let mut candidates = Vec::new();
        for p in 0..=self.search.max_p {
            for q in 0..=self.search.max_q {
                let model = ArimaModel::new(p, d, q);
                if model.min_observations() + 3 <= values.len() {
                    candidates.push(model);
                }
            }
        }
        candidates
    }
}

impl ForecastModel for AutoArima {
    type Fitted = FittedArima;

    fn fit(&self, values: &[f64]) -> Result<FittedArima> {
        let needed = self.search.min_observations;
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let mut best: Option<FittedArima> = None;
        for candidate in self.candidates(values) {
            match candidate.fit(values) {
                Ok(fitted) if fitted.aic().is_finite() => {
                    debug!(model = %candidate.name(), aic = fitted.aic(), "ARIMA candidate fitted");
                    if best.as_ref().map_or(true, |b| fitted.aic() < b.aic()) {
                        best = Some(fitted);
                    }
                }
                Ok(_) => debug!(model = %candidate.name(), "ARIMA candidate has no finite AIC"),
                Err(err) => debug!(model = %candidate.name(), error = %err, "ARIMA candidate failed"),
            }
        }

        best.ok_or_else(|| {
            ForecastError::ModelFit(format!(
                "No ARIMA order could be fitted to {} observations",
                values.len()
            ))
        })
    }

    fn name(&self) -> String {
        "AutoARIMA".to_string()
    }
}
