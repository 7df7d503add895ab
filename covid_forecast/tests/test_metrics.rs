use approx::assert_relative_eq;
use covid_forecast::metrics::{mape, rmse, ForecastMetrics};
use rstest::rstest;

#[rstest]
#[case(1.5)]
#[case(42.0)]
#[case(1_000_000.0)]
fn test_mape_of_identical_values_is_zero(#[case] x: f64) {
    assert_eq!(mape(&[x], &[x]).unwrap(), 0.0);
}

#[test]
fn test_mape_clips_both_inputs() {
    assert_eq!(mape(&[0.5], &[0.5]).unwrap(), 0.0);
    assert_eq!(mape(&[1.0, -2.0], &[0.0, 0.7]).unwrap(), 0.0);
}

#[test]
fn test_regression_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    assert_relative_eq!(rmse(&actual, &predicted).unwrap(), 6.0_f64.sqrt());

    // 20% + 10% + 10% + 7.5% + 4%
    assert_relative_eq!(mape(&actual, &predicted).unwrap(), 10.3, epsilon = 1e-9);
}

#[test]
fn test_metrics_are_non_negative() {
    let actual = [100.0, 250.0, 0.0, 3.0];
    let predicted = [130.0, 200.0, 5.0, -1.0];
    let metrics = ForecastMetrics::evaluate(&actual, &predicted).unwrap();
    assert!(metrics.rmse >= 0.0);
    assert!(metrics.mape >= 0.0);

    let exact = ForecastMetrics::evaluate(&actual, &actual).unwrap();
    assert_eq!(exact.rmse, 0.0);
    assert_eq!(exact.mape, 0.0);
}

#[test]
fn test_metrics_serialize() {
    let metrics = ForecastMetrics { rmse: 1.5, mape: 2.25 };
    let json = serde_json::to_value(metrics).unwrap();
    assert_eq!(json, serde_json::json!({"rmse": 1.5, "mape": 2.25}));
    assert_eq!(metrics.to_string(), "RMSE: 1.50, MAPE: 2.25%");
}

#[test]
fn test_error_handling() {
    assert!(mape(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_err());
    assert!(rmse(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_err());
}
