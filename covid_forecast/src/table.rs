//! Date-indexed series and plot-ready tables

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

/// Name of the date column in exported tables
pub const DATE_COLUMN: &str = "Date";

/// Named series of `(date, value)` points in strictly increasing date order
#[derive(Debug, Clone, PartialEq)]
pub struct DatedSeries {
    name: String,
    points: Vec<(NaiveDate, f64)>,
}

impl DatedSeries {
    /// Create a series, rejecting unordered or duplicate dates
    pub fn new(name: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Result<Self> {
        if let Some(pair) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(ForecastError::Data(format!(
                "Dates must be strictly increasing: {} is followed by {}",
                pair[0].0, pair[1].0
            )));
        }
        Ok(Self {
            name: name.into(),
            points,
        })
    }

    /// Series without points
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    /// Series name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Points in date order
    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    /// Dates in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|(d, _)| *d).collect()
    }

    /// Values in date order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First date, if any
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    /// Last date, if any
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }
}

/// Column of a [`ForecastTable`]; `None` marks dates the series does not cover
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Outer join of several dated series on their dates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastTable {
    dates: Vec<NaiveDate>,
    columns: Vec<TableColumn>,
}

impl ForecastTable {
    /// Join `series` on date. Every date of any series appears once, in order.
    pub fn outer_join(series: &[DatedSeries]) -> Self {
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.points.iter().map(|(d, _)| *d))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = series
            .iter()
            .map(|s| {
                let mut values = vec![None; dates.len()];
                for (date, value) in &s.points {
                    if let Ok(i) = dates.binary_search(date) {
                        values[i] = Some(*value);
                    }
                }
                TableColumn {
                    name: s.name.clone(),
                    values,
                }
            })
            .collect();

        Self { dates, columns }
    }

    /// Outer join of two tables, keeping the columns of `self` first
    pub fn merge(&self, other: &ForecastTable) -> Self {
        let series: Vec<DatedSeries> = self
            .to_series()
            .into_iter()
            .chain(other.to_series())
            .collect();
        Self::outer_join(&series)
    }

    /// Split the table back into one series per column, dropping missing values
    pub fn to_series(&self) -> Vec<DatedSeries> {
        self.columns
            .iter()
            .map(|c| DatedSeries {
                name: c.name.clone(),
                points: self
                    .dates
                    .iter()
                    .zip(c.values.iter())
                    .filter_map(|(d, v)| v.map(|v| (*d, v)))
                    .collect(),
            })
            .collect()
    }

    /// Date index
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Columns in insertion order
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Values of the named column
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Value of the named column on `date`
    pub fn value(&self, name: &str, date: NaiveDate) -> Option<f64> {
        let i = self.dates.binary_search(&date).ok()?;
        self.column(name)?[i]
    }

    /// Number of dates
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Convert to a polars DataFrame with a leading `Date` column
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut series = vec![Series::new(DATE_COLUMN, self.dates.as_slice())];
        series.extend(
            self.columns
                .iter()
                .map(|c| Series::new(c.name.as_str(), c.values.as_slice())),
        );
        Ok(DataFrame::new(series)?)
    }

    /// Write the table as CSV, missing values left blank
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, d).unwrap()
    }

    #[test]
    fn rejects_duplicate_dates() {
        let result = DatedSeries::new("x", vec![(day(1), 1.0), (day(1), 2.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn outer_join_leaves_gaps_empty() {
        let a = DatedSeries::new("a", vec![(day(1), 1.0), (day(2), 2.0)]).unwrap();
        let b = DatedSeries::new("b", vec![(day(2), 20.0), (day(4), 40.0)]).unwrap();
        let table = ForecastTable::outer_join(&[a, b]);

        assert_eq!(table.dates(), &[day(1), day(2), day(4)]);
        assert_eq!(table.column("a").unwrap(), &[Some(1.0), Some(2.0), None]);
        assert_eq!(table.column("b").unwrap(), &[None, Some(20.0), Some(40.0)]);
        assert_eq!(table.value("b", day(4)), Some(40.0));
    }

    #[test]
    fn merge_keeps_column_order() {
        let a = ForecastTable::outer_join(&[DatedSeries::new("a", vec![(day(3), 3.0)]).unwrap()]);
        let b = ForecastTable::outer_join(&[DatedSeries::new("b", vec![(day(1), 1.0)]).unwrap()]);
        let merged = a.merge(&b);
        assert_eq!(merged.column_names(), vec!["a", "b"]);
        assert_eq!(merged.dates(), &[day(1), day(3)]);
    }

    #[test]
    fn dataframe_has_date_column() {
        let a = DatedSeries::new("a", vec![(day(1), 1.0), (day(3), 3.0)]).unwrap();
        let df = ForecastTable::outer_join(&[a]).to_dataframe().unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.get_column_names(), vec![DATE_COLUMN, "a"]);
    }
}
