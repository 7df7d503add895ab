//! ARIMA models for time series forecasting

use crate::error::{ForecastError, Result};
use crate::models::diff::{difference, integrate};
use crate::models::{FittedModel, ForecastModel, MIN_VARIANCE};
use crate::optimization::{nelder_mead, SimplexConfig};
use std::f64::consts::PI;

/// Bound on AR and MA coefficients during estimation
const COEFFICIENT_BOUND: f64 = 0.99;

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaModel {
    /// AR order (p)
    p: usize,
    /// Differencing order (d)
    d: usize,
    /// MA order (q)
    q: usize,
}

/// Fitted ARIMA model
#[derive(Debug, Clone)]
pub struct FittedArima {
    /// Specification the coefficients belong to
    spec: ArimaModel,
    /// Mean of the differenced series
    intercept: f64,
    /// Fitted AR coefficients
    ar_coefficients: Vec<f64>,
    /// Fitted MA coefficients
    ma_coefficients: Vec<f64>,
    /// Observations on the original scale
    history: Vec<f64>,
    /// Observations after differencing
    differenced: Vec<f64>,
    /// One-step residuals on the differenced scale
    residuals: Vec<f64>,
    /// Residual variance
    variance: f64,
    /// Akaike information criterion
    aic: f64,
}

impl ArimaModel {
    /// Create a new ARIMA(p, d, q) model
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// The `(p, d, q)` order
    pub fn order(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.q)
    }

    /// Number of estimated parameters, AR + MA + intercept
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }

    /// Shortest series this order can be fitted to
    pub fn min_observations(&self) -> usize {
        self.d + self.p.max(self.q) + 2
    }

    /// Residuals of the recursion for the given parameters
    fn residuals(&self, series: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
        let start = self.p.max(self.q);
        let mut residuals = vec![0.0; series.len()];

        for t in start..series.len() {
            let mut pred = intercept;
            for (i, phi) in ar.iter().enumerate() {
                pred += phi * (series[t - 1 - i] - intercept);
            }
            for (i, theta) in ma.iter().enumerate() {
                pred += theta * residuals[t - 1 - i];
            }
            residuals[t] = series[t] - pred;
        }

        residuals
    }

    /// Conditional sum of squares for the packed parameter vector
    fn css(&self, series: &[f64], params: &[f64]) -> f64 {
        let (intercept, ar, ma) = self.unpack(params);
        self.residuals(series, intercept, ar, ma)
            .iter()
            .skip(self.p.max(self.q))
            .map(|e| e * e)
            .sum()
    }

    fn unpack<'a>(&self, params: &'a [f64]) -> (f64, &'a [f64], &'a [f64]) {
        (params[0], &params[1..1 + self.p], &params[1 + self.p..])
    }

    /// Estimate parameters on the differenced series, starting from `initial`
    /// when given
    fn estimate(&self, differenced: &[f64], initial: Option<Vec<f64>>) -> Vec<f64> {
        let mean = differenced.iter().sum::<f64>() / differenced.len() as f64;
        if self.p == 0 && self.q == 0 {
            return vec![mean];
        }

        let initial = initial.unwrap_or_else(|| {
            let mut start = vec![mean];
            start.extend((0..self.p).map(|i| 0.1 / (i + 1) as f64));
            start.extend((0..self.q).map(|i| 0.1 / (i + 1) as f64));
            start
        });

        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-COEFFICIENT_BOUND, COEFFICIENT_BOUND)).take(self.p + self.q));

        nelder_mead(
            |params| self.css(differenced, params),
            &initial,
            &bounds,
            &SimplexConfig::default(),
        )
        .point
    }

    fn fit_from(&self, values: &[f64], initial: Option<Vec<f64>>) -> Result<FittedArima> {
        let needed = self.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "ARIMA input must be finite".to_string(),
            ));
        }

        let differenced = difference(values, self.d);
        let params = self.estimate(&differenced, initial);
        let (intercept, ar, ma) = self.unpack(&params);
        let residuals = self.residuals(&differenced, intercept, ar, ma);

        let start = self.p.max(self.q);
        let n_eff = (differenced.len() - start) as f64;
        let variance =
            (residuals[start..].iter().map(|e| e * e).sum::<f64>() / n_eff).max(MIN_VARIANCE);
        let log_likelihood = -0.5 * n_eff * (1.0 + variance.ln() + (2.0 * PI).ln());
        let aic = -2.0 * log_likelihood + 2.0 * self.num_params() as f64;

        Ok(FittedArima {
            spec: *self,
            intercept,
            ar_coefficients: ar.to_vec(),
            ma_coefficients: ma.to_vec(),
            history: values.to_vec(),
            differenced,
            residuals,
            variance,
            aic,
        })
    }
}

impl ForecastModel for ArimaModel {
    type Fitted = FittedArima;

    fn fit(&self, values: &[f64]) -> Result<FittedArima> {
        self.fit_from(values, None)
    }

    fn name(&self) -> String {
        format!("ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

impl FittedArima {
    /// Specification of the fitted model
    pub fn spec(&self) -> ArimaModel {
        self.spec
    }

    /// Intercept on the differenced scale
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// AR coefficients
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// MA coefficients
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Residual variance
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Add newly observed values and re-estimate the coefficients,
    /// starting from the current ones. The order is kept.
    pub fn update(&self, observations: &[f64]) -> Result<FittedArima> {
        if observations.is_empty() {
            return Ok(self.clone());
        }

        let mut values = self.history.clone();
        values.extend_from_slice(observations);

        let mut initial = vec![self.intercept];
        initial.extend_from_slice(&self.ar_coefficients);
        initial.extend_from_slice(&self.ma_coefficients);

        let initial = (self.spec.num_params() > 1).then_some(initial);
        self.spec.fit_from(&values, initial)
    }
}

impl FittedModel for FittedArima {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        if horizon == 0 {
            return Ok(Vec::new());
        }

        let mut extended = self.differenced.clone();
        let mut residuals = self.residuals.clone();

        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = self.intercept;
            for (i, phi) in self.ar_coefficients.iter().enumerate() {
                if t > i {
                    pred += phi * (extended[t - 1 - i] - self.intercept);
                }
            }
            for (i, theta) in self.ma_coefficients.iter().enumerate() {
                if t > i {
                    pred += theta * residuals[t - 1 - i];
                }
            }
            extended.push(pred);
            // future shocks have zero expectation
            residuals.push(0.0);
        }

        let forecast = &extended[self.differenced.len()..];
        Ok(integrate(forecast, &self.history, self.spec.d))
    }

    fn aic(&self) -> f64 {
        self.aic
    }

    fn n_obs(&self) -> usize {
        self.history.len()
    }

    fn name(&self) -> String {
        self.spec.name()
    }
}
