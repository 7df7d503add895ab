//! Exponential smoothing (Holt-Winters) models for time series forecasting
//!
//! Trend and seasonality are each optional and either additive or
//! multiplicative. With `b` the trend and `s` the seasonal index at the
//! same phase one season earlier, the one-step forecast from level `l` is
//!
//! - base: `l` (no trend), `l + b` (additive) or `l * b` (multiplicative)
//! - forecast: `base`, `base + s` or `base * s`
//!
//! The smoothing parameters are estimated by minimising the sum of squared
//! one-step errors.

use crate::config::Component;
use crate::error::{ForecastError, Result};
use crate::models::{FittedModel, ForecastModel, MIN_VARIANCE};
use crate::optimization::{nelder_mead, SimplexConfig};
use tracing::debug;

/// Bounds on the smoothing parameters
const PARAM_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Guard against division by vanishing levels and seasonal indices
const EPS: f64 = 1e-10;

/// Holt-Winters exponential smoothing specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialSmoothing {
    /// Trend component, if any
    trend: Option<Component>,
    /// Seasonal component, if any
    seasonal: Option<Component>,
    /// Season length, ignored without a seasonal component
    seasonal_period: usize,
}

/// Fitted exponential smoothing model
#[derive(Debug, Clone)]
pub struct FittedExponentialSmoothing {
    spec: ExponentialSmoothing,
    alpha: f64,
    beta: Option<f64>,
    gamma: Option<f64>,
    /// Final level
    level: f64,
    /// Final trend (0 additive / 1 multiplicative when absent)
    trend: f64,
    /// Final seasonal indices, indexed by observation position modulo the period
    seasonals: Vec<f64>,
    /// One-step fitted values
    fitted: Vec<f64>,
    sse: f64,
    aic: f64,
}

/// Smoothing state carried through the recursion
#[derive(Debug, Clone)]
struct State {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
}

impl ExponentialSmoothing {
    /// Create a new specification
    pub fn new(
        trend: Option<Component>,
        seasonal: Option<Component>,
        seasonal_period: usize,
    ) -> Result<Self> {
        if seasonal.is_some() && seasonal_period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2, got {}",
                seasonal_period
            )));
        }

        Ok(Self {
            trend,
            seasonal,
            seasonal_period,
        })
    }

    /// Trend component
    pub fn trend(&self) -> Option<Component> {
        self.trend
    }

    /// Seasonal component
    pub fn seasonal(&self) -> Option<Component> {
        self.seasonal
    }

    /// Season length
    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    /// Whether any component is multiplicative
    pub fn is_multiplicative(&self) -> bool {
        self.trend == Some(Component::Multiplicative)
            || self.seasonal == Some(Component::Multiplicative)
    }

    fn period(&self) -> usize {
        if self.seasonal.is_some() {
            self.seasonal_period
        } else {
            1
        }
    }

    /// Shortest series this specification can be fitted to
    pub fn min_observations(&self) -> usize {
        if self.seasonal.is_some() {
            2 * self.seasonal_period
        } else if self.trend.is_some() {
            3
        } else {
            2
        }
    }

    /// Parameters counted by the AIC: smoothing parameters plus initial states
    fn num_params(&self) -> usize {
        let mut k = 2;
        if self.trend.is_some() {
            k += 2;
        }
        if self.seasonal.is_some() {
            k += 1 + self.seasonal_period;
        }
        k
    }

    /// Heuristic state just before the first observation
    fn initial_state(&self, values: &[f64]) -> State {
        let m = self.period();
        let mean = |slice: &[f64]| slice.iter().sum::<f64>() / slice.len() as f64;

        if self.seasonal.is_none() {
            let trend = match self.trend {
                None => 0.0,
                Some(Component::Additive) => values[1] - values[0],
                Some(Component::Multiplicative) => values[1] / values[0],
            };
            let level = match self.trend {
                None => values[0],
                Some(Component::Additive) => values[0] - trend,
                Some(Component::Multiplicative) => values[0] / trend,
            };
            return State {
                level,
                trend,
                seasonals: vec![0.0],
            };
        }

        let first = mean(&values[..m]);
        let second = mean(&values[m..2 * m]);
        // distance from the centre of the first season back to position -1
        let lead = (m as f64 + 1.0) / 2.0;
        let (level, trend) = match self.trend {
            None => (first, 0.0),
            Some(Component::Additive) => {
                let b = (second - first) / m as f64;
                (first - lead * b, b)
            }
            Some(Component::Multiplicative) => {
                let b = (second / first).powf(1.0 / m as f64);
                (first / b.powf(lead), b)
            }
        };

        let mut seasonals: Vec<f64> = match self.seasonal {
            Some(Component::Multiplicative) => values[..m].iter().map(|y| y / first).collect(),
            _ => values[..m].iter().map(|y| y - first).collect(),
        };
        let centre = mean(&seasonals);
        for s in seasonals.iter_mut() {
            match self.seasonal {
                Some(Component::Multiplicative) => *s /= centre,
                _ => *s -= centre,
            }
        }

        State {
            level,
            trend,
            seasonals,
        }
    }

    fn base(&self, level: f64, trend: f64, steps: f64) -> f64 {
        match self.trend {
            None => level,
            Some(Component::Additive) => level + steps * trend,
            Some(Component::Multiplicative) => level * trend.powf(steps),
        }
    }

    fn combine(&self, base: f64, season: f64) -> f64 {
        match self.seasonal {
            None => base,
            Some(Component::Additive) => base + season,
            Some(Component::Multiplicative) => base * season,
        }
    }

    /// Run the recursion over `values`, returning the final state, fitted
    /// values and the sum of squared one-step errors
    fn filter(&self, values: &[f64], alpha: f64, beta: f64, gamma: f64) -> (State, Vec<f64>, f64) {
        let m = self.period();
        let mut state = self.initial_state(values);
        let mut fitted = Vec::with_capacity(values.len());
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate() {
            let idx = t % m;
            let season = state.seasonals[idx];
            let base = self.base(state.level, state.trend, 1.0);
            let forecast = self.combine(base, season);

            let error = y - forecast;
            sse += error * error;
            fitted.push(forecast);

            let deseasonalised = match self.seasonal {
                None => y,
                Some(Component::Additive) => y - season,
                Some(Component::Multiplicative) if season.abs() > EPS => y / season,
                Some(Component::Multiplicative) => y,
            };
            let previous_level = state.level;
            state.level = alpha * deseasonalised + (1.0 - alpha) * base;

            state.trend = match self.trend {
                None => state.trend,
                Some(Component::Additive) => {
                    beta * (state.level - previous_level) + (1.0 - beta) * state.trend
                }
                Some(Component::Multiplicative) if previous_level.abs() > EPS => {
                    beta * (state.level / previous_level) + (1.0 - beta) * state.trend
                }
                Some(Component::Multiplicative) => state.trend,
            };

            state.seasonals[idx] = match self.seasonal {
                None => season,
                Some(Component::Additive) => gamma * (y - base) + (1.0 - gamma) * season,
                Some(Component::Multiplicative) if base.abs() > EPS => {
                    gamma * (y / base) + (1.0 - gamma) * season
                }
                Some(Component::Multiplicative) => season,
            };
        }

        (state, fitted, sse)
    }

    /// Expand the optimiser's vector into `(alpha, beta, gamma)`
    fn unpack(&self, params: &[f64]) -> (f64, f64, f64) {
        let mut it = params.iter().copied();
        let alpha = it.next().unwrap_or(PARAM_BOUNDS.0);
        let beta = if self.trend.is_some() {
            it.next().unwrap_or(PARAM_BOUNDS.0)
        } else {
            0.0
        };
        let gamma = if self.seasonal.is_some() {
            it.next().unwrap_or(PARAM_BOUNDS.0)
        } else {
            0.0
        };
        (alpha, beta, gamma)
    }

    fn validate(&self, values: &[f64]) -> Result<()> {
        let needed = self.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "Exponential smoothing input must be finite".to_string(),
            ));
        }
        if self.is_multiplicative() && values.iter().any(|&v| v <= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "{} requires strictly positive data",
                self.name()
            )));
        }
        Ok(())
    }
}

impl ForecastModel for ExponentialSmoothing {
    type Fitted = FittedExponentialSmoothing;

    fn fit(&self, values: &[f64]) -> Result<FittedExponentialSmoothing> {
        self.validate(values)?;

        let mut initial = vec![0.3];
        if self.trend.is_some() {
            initial.push(0.1);
        }
        if self.seasonal.is_some() {
            initial.push(0.1);
        }
        let bounds = vec![PARAM_BOUNDS; initial.len()];

        let minimum = nelder_mead(
            |params| {
                let (alpha, beta, gamma) = self.unpack(params);
                self.filter(values, alpha, beta, gamma).2
            },
            &initial,
            &bounds,
            &SimplexConfig::default(),
        );
        debug!(
            model = %self.name(),
            iterations = minimum.iterations,
            converged = minimum.converged,
            "Smoothing parameters estimated"
        );

        let (alpha, beta, gamma) = self.unpack(&minimum.point);
        let (state, fitted, sse) = self.filter(values, alpha, beta, gamma);
        if !sse.is_finite() || !state.level.is_finite() || !state.trend.is_finite() {
            return Err(ForecastError::ModelFit(format!(
                "{} diverged on {} observations",
                self.name(),
                values.len()
            )));
        }

        let n = values.len() as f64;
        let aic = n * (sse / n).max(MIN_VARIANCE).ln() + 2.0 * self.num_params() as f64;

        Ok(FittedExponentialSmoothing {
            spec: *self,
            alpha,
            beta: self.trend.map(|_| beta),
            gamma: self.seasonal.map(|_| gamma),
            level: state.level,
            trend: state.trend,
            seasonals: state.seasonals,
            fitted,
            sse,
            aic,
        })
    }

    fn name(&self) -> String {
        let describe = |c: Option<Component>| c.map_or("none".to_string(), |c| c.to_string());
        match self.seasonal {
            Some(_) => format!(
                "Holt-Winters(trend={}, seasonal={}, period={})",
                describe(self.trend),
                describe(self.seasonal),
                self.seasonal_period
            ),
            None => format!(
                "Holt-Winters(trend={}, seasonal=none)",
                describe(self.trend)
            ),
        }
    }
}

impl FittedExponentialSmoothing {
    /// Specification of the fitted model
    pub fn spec(&self) -> ExponentialSmoothing {
        self.spec
    }

    /// Level smoothing parameter
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Trend smoothing parameter
    pub fn beta(&self) -> Option<f64> {
        self.beta
    }

    /// Seasonal smoothing parameter
    pub fn gamma(&self) -> Option<f64> {
        self.gamma
    }

    /// One-step fitted values
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    /// Sum of squared one-step errors
    pub fn sse(&self) -> f64 {
        self.sse
    }
}

impl FittedModel for FittedExponentialSmoothing {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let n = self.fitted.len();
        let m = self.seasonals.len();
        let forecast: Vec<f64> = (1..=horizon)
            .map(|h| {
                let base = self.spec.base(self.level, self.trend, h as f64);
                let season = self.seasonals[(n + h - 1) % m];
                self.spec.combine(base, season)
            })
            .collect();

        if forecast.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFit(format!(
                "{} produced a non-finite forecast",
                self.spec.name()
            )));
        }
        Ok(forecast)
    }

    fn aic(&self) -> f64 {
        self.aic
    }

    fn n_obs(&self) -> usize {
        self.fitted.len()
    }

    fn name(&self) -> String {
        self.spec.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[rstest]
    #[case(None, None)]
    #[case(Some(Component::Additive), None)]
    #[case(Some(Component::Multiplicative), None)]
    #[case(None, Some(Component::Additive))]
    #[case(Some(Component::Additive), Some(Component::Multiplicative))]
    #[case(Some(Component::Multiplicative), Some(Component::Multiplicative))]
    fn constant_series_stays_constant(
        #[case] trend: Option<Component>,
        #[case] seasonal: Option<Component>,
    ) {
        let model = ExponentialSmoothing::new(trend, seasonal, 7).unwrap();
        let fitted = model.fit(&vec![1000.0; 60]).unwrap();
        assert!(fitted.aic().is_finite());
        assert_abs_diff_eq!(fitted.sse(), 0.0, epsilon = 1e-6);
        assert_eq!(fitted.fitted_values().len(), 60);
        assert_eq!(fitted.beta().is_some(), trend.is_some());
        assert_eq!(fitted.gamma().is_some(), seasonal.is_some());
        assert!(fitted.alpha() > 0.0 && fitted.alpha() < 1.0);
        for v in fitted.forecast(15).unwrap() {
            assert_abs_diff_eq!(v, 1000.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn additive_trend_is_extrapolated() {
        let values: Vec<f64> = (0..50).map(|i| 100.0 + 5.0 * i as f64).collect();
        let model = ExponentialSmoothing::new(Some(Component::Additive), None, 7).unwrap();
        let forecast = model.fit(&values).unwrap().forecast(3).unwrap();
        assert_abs_diff_eq!(forecast[0], 350.0, epsilon = 1.0);
        assert_abs_diff_eq!(forecast[2], 360.0, epsilon = 1.0);
    }

    #[test]
    fn weekly_pattern_is_repeated() {
        let pattern = [10.0, 12.0, 14.0, 16.0, 14.0, 12.0, 8.0];
        let values: Vec<f64> = (0..70).map(|i| 200.0 + pattern[i % 7]).collect();
        let model = ExponentialSmoothing::new(None, Some(Component::Additive), 7).unwrap();
        let forecast = model.fit(&values).unwrap().forecast(7).unwrap();
        for (h, v) in forecast.iter().enumerate() {
            assert_abs_diff_eq!(*v, 200.0 + pattern[(70 + h) % 7], epsilon = 0.5);
        }
    }

    #[test]
    fn seasonal_fit_needs_two_seasons() {
        let model = ExponentialSmoothing::new(None, Some(Component::Additive), 30).unwrap();
        let result = model.fit(&vec![5.0; 40]);
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData { needed: 60, got: 40 })
        ));
    }

    #[test]
    fn multiplicative_rejects_non_positive_data() {
        let model = ExponentialSmoothing::new(Some(Component::Multiplicative), None, 7).unwrap();
        let mut values = vec![10.0; 20];
        values[3] = 0.0;
        assert!(matches!(
            model.fit(&values),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn zero_horizon_is_empty() {
        let model = ExponentialSmoothing::new(None, None, 7).unwrap();
        let fitted = model.fit(&[1.0, 2.0, 3.0]).unwrap();
        assert!(fitted.forecast(0).unwrap().is_empty());
    }
}
