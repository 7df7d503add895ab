//! # COVID Forecasting
//!
//! Workspace entry point re-exporting the [`covid_forecast`] library.
//!
//! ## Example
//!
//! ```
//! use covid_forecasting_workspace::{mape, rmse};
//!
//! assert_eq!(mape(&[120.0], &[120.0]).unwrap(), 0.0);
//! assert_eq!(rmse(&[1.0, 2.0], &[1.0, 2.0]).unwrap(), 0.0);
//! ```

pub use covid_forecast::*;
