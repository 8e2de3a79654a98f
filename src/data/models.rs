//! Data models for COVID-19 case reports.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Province name used when a report row has none
pub const UNKNOWN_PROVINCE: &str = "Unknown";

/// A report row as read from a CSV file, before cleaning.
///
/// Country and date are always present (rows without a country are never
/// kept); every other field may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub country: String,
    pub province: Option<String>,
    pub date: NaiveDate,
    pub confirmed: Option<i64>,
    pub deaths: Option<i64>,
    pub recovered: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One cleaned row of case data for a country/province on a report date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub country: String,
    pub province: String,
    pub date: NaiveDate,
    pub confirmed: i64,
    pub deaths: i64,
    pub recovered: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Observation {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }
}

/// Observations of one country on one date, summed over provinces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub country: String,
    pub date: NaiveDate,
    pub confirmed: i64,
    pub deaths: i64,
    pub recovered: i64,
    /// Mean latitude of the aggregated rows
    pub latitude: f64,
    /// Mean longitude of the aggregated rows
    pub longitude: f64,
}

impl DailyTotal {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    /// `YYYY-MM` key used by monthly statistics and charts
    pub fn month_key(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

/// Counters produced by the cleaning step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub rows: usize,
    pub provinces_imputed: usize,
    pub counts_imputed: usize,
    pub coordinates_imputed: usize,
}

impl CleanReport {
    pub fn total_imputed(&self) -> usize {
        self.provinces_imputed + self.counts_imputed + self.coordinates_imputed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_key_is_zero_padded() {
        let total = DailyTotal {
            country: "Italy".to_string(),
            date: NaiveDate::from_ymd_opt(2022, 3, 9).unwrap(),
            confirmed: 1,
            deaths: 0,
            recovered: 0,
            latitude: 0.0,
            longitude: 0.0,
        };
        assert_eq!(total.month_key(), "2022-03");
        assert_eq!(total.year(), 2022);
        assert_eq!(total.month(), 3);
    }
}
