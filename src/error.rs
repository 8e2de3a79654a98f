//! Error type shared by the data, analysis and output layers.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovidError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV folder not found: {0:?}")]
    MissingCsvDir(PathBuf),

    #[error("No CSV reports found in {0:?}")]
    NoReports(PathBuf),

    #[error("Report has no {0} column")]
    MissingColumn(&'static str),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("End date {end} must be after start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid {field} '{value}'")]
    InvalidFilter { field: &'static str, value: String },

    #[error("Chart rendering failed: {0}")]
    Plot(String),

    #[error("No data loaded")]
    NoData,
}

impl From<::config::ConfigError> for CovidError {
    fn from(err: ::config::ConfigError) -> Self {
        CovidError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CovidError>;
