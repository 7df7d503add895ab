use chrono::{Duration, NaiveDate};
use covid_forecast::forecaster::SelectedModel;
use covid_forecast::report::{TEST_COLUMN, TRAIN_COLUMN};
use covid_forecast::{CaseData, ForecastConfig, ForecastError, ForecastReport};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

const DAYS: i64 = 90;

fn first_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 2, 20).unwrap()
}

// Helper function to create a case count file for testing
fn create_sample_data() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Country/Region,US,Australia").unwrap();
    writeln!(file, "Province/State,,Victoria").unwrap();

    let weekly = [1.0, 1.02, 1.03, 1.01, 0.99, 0.97, 0.98];
    for i in 0..DAYS {
        let date = first_day() + Duration::days(i);
        let us = (100.0 * (0.05 * i as f64).exp() * weekly[i as usize % 7]).round();
        let victoria = if i < 20 { 0.0 } else { 3.0 * (i - 20) as f64 };
        writeln!(file, "{},{},{}", date.format("%-m/%-d/%y"), us, victoria).unwrap();
    }
    file
}

#[test]
fn test_end_to_end_report() {
    // 1. Load the case counts
    let file = create_sample_data();
    let data = CaseData::from_csv(file.path()).unwrap();
    assert_eq!(data.len(), DAYS as usize);

    // 2. Build the report for one region
    let series = data.series("US").unwrap();
    let config = ForecastConfig::default();
    let report = ForecastReport::build(&series, &config).unwrap();

    let observed_end = first_day() + Duration::days(DAYS - 1);
    assert_eq!(report.region, "US");
    assert_eq!(report.observed_end, observed_end);

    // 3. Check the table layout
    let table = &report.table;
    assert_eq!(
        table.column_names(),
        vec![
            TRAIN_COLUMN,
            TEST_COLUMN,
            "ARIMA - Test",
            "ARIMA - Forecast",
            "Holt-Winters - Test",
            "Holt-Winters - Forecast",
        ]
    );

    // every day from the first modelled date to the end of the forecast, once
    let first = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
    let expected: Vec<NaiveDate> = (0..)
        .map(|i| first + Duration::days(i))
        .take_while(|d| *d <= observed_end + Duration::days(15))
        .collect();
    assert_eq!(table.dates(), expected.as_slice());

    // 4. Segments connect on their anchor dates
    let train_end = table
        .column(TRAIN_COLUMN)
        .unwrap()
        .iter()
        .rposition(Option::is_some)
        .unwrap();
    let train_end_date = table.dates()[train_end];
    for label in ["ARIMA", "Holt-Winters"] {
        let model = report.model(label).unwrap();
        assert_eq!(model.test.first_date(), Some(train_end_date));
        assert_eq!(model.test.last_date(), Some(observed_end));
        assert_eq!(model.forecast.first_date(), Some(observed_end));
        assert_eq!(
            table.value(&format!("{} - Forecast", label), observed_end),
            table.value(TEST_COLUMN, observed_end)
        );
        assert_eq!(
            table.value(&format!("{} - Test", label), train_end_date),
            table.value(TRAIN_COLUMN, train_end_date)
        );

        let metrics = model.metrics.unwrap();
        assert!(metrics.rmse.is_finite() && metrics.rmse >= 0.0);
        assert!(metrics.mape.is_finite() && metrics.mape >= 0.0);
    }
    assert_eq!(
        table.value(TEST_COLUMN, train_end_date),
        table.value(TRAIN_COLUMN, train_end_date)
    );

    // 5. Metrics output
    let text = report.metrics_text();
    assert!(text.contains("ARIMA RMSE:"));
    assert!(text.contains("Holt-Winters MAPE:"));

    let json = serde_json::to_value(report.metrics()).unwrap();
    assert_eq!(json["region"], "US");
    assert!(json["models"]["ARIMA"]["rmse"].is_number());
    assert!(json["models"]["Holt-Winters"]["mape"].is_number());
}

#[test]
fn test_zero_counts_region() {
    let file = create_sample_data();
    let data = CaseData::from_csv(file.path()).unwrap();
    let series = data.series("Australia - Victoria").unwrap();

    let report = ForecastReport::build(&series, &ForecastConfig::default()).unwrap();
    match report.model("Holt-Winters").unwrap().selected {
        SelectedModel::HoltWinters(model) => assert!(!model.is_multiplicative()),
        other => panic!("unexpected model {:?}", other),
    }
}

#[test]
fn test_table_export() {
    let file = create_sample_data();
    let data = CaseData::from_csv(file.path()).unwrap();
    let series = data.series("US").unwrap();
    let report = ForecastReport::build(&series, &ForecastConfig::default()).unwrap();

    let output = NamedTempFile::new().unwrap();
    report.table.write_csv(output.path()).unwrap();

    let mut reader = csv::Reader::from_path(output.path()).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers[0], "Date");
    assert_eq!(headers.len(), report.table.columns().len() + 1);
    assert_eq!(reader.records().count(), report.table.len());
}

#[test]
fn test_no_observations_after_cutoff() {
    let file = create_sample_data();
    let data = CaseData::from_csv(file.path()).unwrap();
    let series = data.series("US").unwrap();

    let mut config = ForecastConfig::default();
    config.observed_after = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    assert!(matches!(
        ForecastReport::build(&series, &config),
        Err(ForecastError::Data(_))
    ));
}

#[test]
fn test_config_from_json() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"forecast_horizon": 10, "holt_winters": {{"seasonal_periods": [7]}}}}"#
    )
    .unwrap();

    let config = ForecastConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.forecast_horizon, 10);
    assert_eq!(config.train_ratio, 0.8);
    assert_eq!(config.holt_winters.seasonal_periods, vec![7]);
    assert_eq!(config.holt_winters.seasonal.len(), 3);

    let data_file = create_sample_data();
    let data = CaseData::from_csv(data_file.path()).unwrap();
    let report = ForecastReport::build(&data.series("US").unwrap(), &config).unwrap();
    assert_eq!(report.model("ARIMA").unwrap().forecast.len(), 11);
}
