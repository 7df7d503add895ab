use chrono::NaiveDate;
use covid_forecast::data::{CaseData, TimeSeries};
use covid_forecast::utils::train_test_split;
use covid_forecast::ForecastError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_case_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Country/Region,US,Australia,Australia").unwrap();
    writeln!(file, "Province/State,,New South Wales,Victoria").unwrap();
    writeln!(file, "2/28/20,10,1,0").unwrap();
    writeln!(file, "2/29/20,15,1,0").unwrap();
    writeln!(file, "3/1/20,30,2,1").unwrap();
    writeln!(file, "3/2/20,53.0,4,1").unwrap();
    file
}

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, m, d).unwrap()
}

#[test]
fn test_case_data_from_csv() {
    let file = write_case_file();
    let data = CaseData::from_csv(file.path()).unwrap();

    assert_eq!(data.len(), 4);
    let labels: Vec<String> = data.regions().iter().map(|r| r.label()).collect();
    assert_eq!(
        labels,
        vec!["US", "Australia - New South Wales", "Australia - Victoria"]
    );

    let us = data.series("US").unwrap();
    assert_eq!(us.name(), "US");
    assert_eq!(us.first_date(), Some(day(2, 28)));
    assert_eq!(us.last_date(), Some(day(3, 2)));
    assert_eq!(us.values(), &[10.0, 15.0, 30.0, 53.0]);

    let victoria = data.series("Australia - Victoria").unwrap();
    assert!(victoria.has_non_positive());
}

#[test]
fn test_unknown_region() {
    let file = write_case_file();
    let data = CaseData::from_csv(file.path()).unwrap();
    assert!(matches!(data.series("France"), Err(ForecastError::Data(_))));
}

#[test]
fn test_case_data_error_handling() {
    assert!(matches!(
        CaseData::from_csv("nonexistent_file.csv"),
        Err(ForecastError::Io(_))
    ));

    let mut bad_date = NamedTempFile::new().unwrap();
    writeln!(bad_date, "Country/Region,US").unwrap();
    writeln!(bad_date, "Province/State,").unwrap();
    writeln!(bad_date, "2020-03-01,5").unwrap();
    assert!(matches!(
        CaseData::from_csv(bad_date.path()),
        Err(ForecastError::DateParse(_))
    ));

    let mut gap = NamedTempFile::new().unwrap();
    writeln!(gap, "Country/Region,US").unwrap();
    writeln!(gap, "Province/State,").unwrap();
    writeln!(gap, "3/1/20,5").unwrap();
    writeln!(gap, "3/3/20,6").unwrap();
    assert!(matches!(
        CaseData::from_csv(gap.path()),
        Err(ForecastError::Data(_))
    ));

    let mut bad_count = NamedTempFile::new().unwrap();
    writeln!(bad_count, "Country/Region,US").unwrap();
    writeln!(bad_count, "Province/State,").unwrap();
    writeln!(bad_count, "3/1/20,many").unwrap();
    assert!(matches!(
        CaseData::from_csv(bad_count.path()),
        Err(ForecastError::Data(_))
    ));
}

#[rstest]
#[case(10, 0.8, 8, 2)]
#[case(7, 0.8, 6, 1)]
#[case(100, 0.5, 50, 50)]
#[case(3, 0.1, 0, 3)]
fn test_train_test_split_sizes(
    #[case] len: usize,
    #[case] ratio: f64,
    #[case] train_len: usize,
    #[case] test_len: usize,
) {
    let series = TimeSeries::from_start("x", day(3, 2), (0..len).map(|i| i as f64).collect());
    let (train, test) = train_test_split(&series, ratio).unwrap();

    assert_eq!(train.len(), train_len);
    assert_eq!(test.len(), test_len);
    if let (Some(last), Some(first)) = (train.last_date(), test.first_date()) {
        assert_eq!(first, last.succ_opt().unwrap());
    }
}

#[test]
fn test_split_rejects_bad_ratio() {
    let series = TimeSeries::from_start("x", day(3, 2), vec![1.0, 2.0]);
    assert!(matches!(
        train_test_split(&series, 1.5),
        Err(ForecastError::InvalidParameter(_))
    ));
}
