//! Time series data handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Date format of the row labels in the case count CSV
pub const DATE_FORMAT: &str = "%m/%d/%y";

/// Daily time series with a contiguous date index.
///
/// Dates are implied by `start` and the position of each value, so a
/// `TimeSeries` can never hold gaps or duplicate dates.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    /// Name of the series, usually the region label
    name: String,
    /// Date of the first observation
    start: NaiveDate,
    /// Observations, one per day
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series from explicit dates, checking they are daily and contiguous
    pub fn new(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::Data(format!(
                "Dates length ({}) doesn't match values length ({})",
                dates.len(),
                values.len()
            )));
        }

        let start = match dates.first() {
            Some(first) => *first,
            None => {
                return Err(ForecastError::Data(
                    "Cannot infer start date of an empty series".to_string(),
                ))
            }
        };

        if let Some(pair) = dates.windows(2).find(|w| w[1] - w[0] != Duration::days(1)) {
            return Err(ForecastError::Data(format!(
                "Dates must be consecutive days: {} is followed by {}",
                pair[0], pair[1]
            )));
        }

        Ok(Self {
            name: name.into(),
            start,
            values,
        })
    }

    /// Create a series of consecutive days beginning at `start`
    pub fn from_start(name: impl Into<String>, start: NaiveDate, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            start,
            values,
        }
    }

    /// Name of the series
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the series
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no observations
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observed values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Date of position `index`. Positions past the end extend the daily index.
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Duration::days(index as i64)
    }

    /// All dates of the series
    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..self.len()).map(|i| self.date_at(i)).collect()
    }

    /// `(date, value)` pairs in date order
    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, v)| (self.date_at(i), *v))
    }

    /// First date, if any
    pub fn first_date(&self) -> Option<NaiveDate> {
        (!self.is_empty()).then_some(self.start)
    }

    /// Last date, if any
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.len().checked_sub(1).map(|i| self.date_at(i))
    }

    /// Last observation with its date
    pub fn last_point(&self) -> Option<(NaiveDate, f64)> {
        Some((self.last_date()?, *self.values.last()?))
    }

    /// Whether any observation is zero or negative
    pub fn has_non_positive(&self) -> bool {
        self.values.iter().any(|&v| v <= 0.0)
    }

    /// Observations in positions `start..end`
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.len() {
            return Err(ForecastError::Data(format!(
                "Invalid slice {}..{} of series with {} observations",
                start,
                end,
                self.len()
            )));
        }

        Ok(Self {
            name: self.name.clone(),
            start: self.date_at(start),
            values: self.values[start..end].to_vec(),
        })
    }

    /// Observations dated strictly after `date`
    pub fn after(&self, date: NaiveDate) -> Self {
        let skip = (date - self.start).num_days() + 1;
        let skip = skip.clamp(0, self.len() as i64) as usize;
        Self {
            name: self.name.clone(),
            start: self.date_at(skip),
            values: self.values[skip..].to_vec(),
        }
    }

    /// Append the observations of `next` that are dated after this series.
    ///
    /// `next` must continue this series without a gap; an overlap of
    /// already observed dates is dropped.
    pub fn extended_with(&self, next: &TimeSeries) -> Result<Self> {
        if next.is_empty() {
            return Ok(self.clone());
        }
        if self.is_empty() {
            return Ok(next.clone().with_name(self.name.clone()));
        }

        let following = self.date_at(self.len());
        let offset = (following - next.start).num_days();
        if offset < 0 {
            return Err(ForecastError::Data(format!(
                "Series starting {} leaves a gap after {}",
                next.start,
                self.date_at(self.len() - 1)
            )));
        }

        let mut values = self.values.clone();
        values.extend(next.values.iter().skip(offset as usize));
        Ok(Self {
            name: self.name.clone(),
            start: self.start,
            values,
        })
    }

    /// Part of `next` dated after the end of this series
    pub fn continuation<'a>(&self, next: &'a TimeSeries) -> &'a [f64] {
        match self.last_date() {
            Some(last) => {
                let skip = (last - next.start).num_days() + 1;
                let skip = skip.clamp(0, next.len() as i64) as usize;
                &next.values[skip..]
            }
            None => &next.values,
        }
    }
}

/// A column of the case count file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Country or region name from the header row
    pub country: String,
    /// Province or state sub-label, if any
    pub province: Option<String>,
}

impl Region {
    /// Display label, `"Country"` or `"Country - Province"`.
    /// Labels double as lookup keys.
    pub fn label(&self) -> String {
        match &self.province {
            Some(province) => format!("{} - {}", self.country, province),
            None => self.country.clone(),
        }
    }
}

/// Cumulative case counts for every region of a wide CSV file
#[derive(Debug, Clone)]
pub struct CaseData {
    regions: Vec<Region>,
    start: NaiveDate,
    columns: Vec<Vec<f64>>,
}

impl CaseData {
    /// Load case counts from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load case counts from any CSV source.
    ///
    /// The header row names the countries after a leading date column, the
    /// first record carries province/state sub-labels and every following
    /// record is a `MM/DD/YY` date with one count per region.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let countries: Vec<String> = csv_reader
            .headers()?
            .iter()
            .skip(1)
            .map(|h| h.trim().to_string())
            .collect();
        if countries.is_empty() {
            return Err(ForecastError::Data(
                "No region columns found in data".to_string(),
            ));
        }

        let mut records = csv_reader.records();
        let sub_labels = match records.next() {
            Some(record) => record?,
            None => {
                return Err(ForecastError::Data(
                    "Missing province/state label row".to_string(),
                ))
            }
        };

        let regions: Vec<Region> = countries
            .into_iter()
            .zip(sub_labels.iter().skip(1))
            .map(|(country, province)| {
                let province = province.trim();
                Region {
                    country,
                    province: (!province.is_empty()).then(|| province.to_string()),
                }
            })
            .collect();

        let mut seen = HashSet::new();
        if let Some(dup) = regions.iter().map(Region::label).find(|l| !seen.insert(l.clone())) {
            return Err(ForecastError::Data(format!("Duplicate region column: {}", dup)));
        }

        let mut dates = Vec::new();
        let mut columns = vec![Vec::new(); regions.len()];
        for record in records {
            let record = record?;
            let label = record.get(0).unwrap_or_default().trim();
            dates.push(NaiveDate::parse_from_str(label, DATE_FORMAT)?);

            for (column, cell) in columns.iter_mut().zip(record.iter().skip(1)) {
                let value = cell.trim().parse::<f64>().map_err(|_| {
                    ForecastError::Data(format!("Invalid count '{}' on {}", cell, label))
                })?;
                column.push(value);
            }
        }

        // Dates are validated once through the shared index
        let start = TimeSeries::new("index", dates.clone(), vec![0.0; dates.len()])?
            .first_date()
            .ok_or_else(|| ForecastError::Data("No dated rows found in data".to_string()))?;

        debug!(
            regions = regions.len(),
            days = dates.len(),
            start = %start,
            "Loaded case counts"
        );

        Ok(Self {
            regions,
            start,
            columns,
        })
    }

    /// All regions in file order
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Number of daily rows
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Whether the file held no dated rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Series for the region with the given label
    pub fn series(&self, label: &str) -> Result<TimeSeries> {
        let index = self
            .regions
            .iter()
            .position(|r| r.label() == label)
            .ok_or_else(|| ForecastError::Data(format!("Unknown region: {}", label)))?;

        Ok(TimeSeries::from_start(
            label,
            self.start,
            self.columns[index].clone(),
        ))
    }
}
