//! Statistics over daily totals.
//!
//! Every statistic yields a [`Table`], the shape the dashboard renders and
//! the export layer writes.

pub mod metrics;
pub mod stats;
mod table;

use chrono::NaiveDate;

pub use table::{Cell, Table};

use crate::data::DailyTotal;
use crate::error::Result;

/// Statistics offered by the dashboard and the `stats` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatKind {
    Country,
    Rates,
    Descriptive,
    Pivot,
    Month,
    Year,
    Wave,
    Range,
}

impl StatKind {
    pub const ALL: [StatKind; 8] = [
        StatKind::Country,
        StatKind::Rates,
        StatKind::Descriptive,
        StatKind::Pivot,
        StatKind::Month,
        StatKind::Year,
        StatKind::Wave,
        StatKind::Range,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatKind::Country => "Country Stats",
            StatKind::Rates => "Rates",
            StatKind::Descriptive => "Descriptive",
            StatKind::Pivot => "Pivot",
            StatKind::Month => "Month Stats",
            StatKind::Year => "Year Stats",
            StatKind::Wave => "Wave Intensity",
            StatKind::Range => "Date Range",
        }
    }

    /// Report title and description
    pub fn heading(self) -> (&'static str, &'static str) {
        match self {
            StatKind::Country => ("Stats by Country", "Cumulative numbers."),
            StatKind::Rates => ("Rates", "Fatality & Recovery Rates."),
            StatKind::Descriptive => ("Descriptive", "Statistical summary."),
            StatKind::Pivot => ("Pivot", "Confirmed Cases by Year."),
            StatKind::Month => ("Monthly", "Monthly statistics."),
            StatKind::Year => ("Yearly", "Yearly statistics."),
            StatKind::Wave => ("Wave Intensity", "Wave intensity comparison."),
            StatKind::Range => ("Date Range", "Filtered analysis."),
        }
    }

    fn file_stem(self) -> &'static str {
        match self {
            StatKind::Country => "stats_by_country",
            StatKind::Rates => "fatality_recovery_rates",
            StatKind::Descriptive => "descriptive_statistics",
            StatKind::Pivot => "pivot_cases_by_year",
            StatKind::Month => "stats_by_month",
            StatKind::Year => "stats_by_year",
            StatKind::Wave => "wave_intensity_comparison",
            StatKind::Range => "stats_by_date_range",
        }
    }

    pub fn needs_range(self) -> bool {
        self == StatKind::Range
    }
}

/// Parameters a statistic may need besides the data
#[derive(Debug, Clone, Default)]
pub struct StatParams {
    /// Years compared by the wave intensity table
    pub years: Vec<i32>,
    /// Start and end dates of the date range statistic
    pub range: Option<(NaiveDate, NaiveDate)>,
}

/// A computed statistic with the names of its output files
#[derive(Debug, Clone)]
pub struct StatResult {
    pub kind: StatKind,
    pub table: Table,
    pub description: String,
    pub export_file: String,
    pub report_file: String,
}

/// Compute a statistic over daily totals
pub fn compute(kind: StatKind, totals: &[DailyTotal], params: &StatParams) -> Result<StatResult> {
    let (title, description) = kind.heading();
    let mut title = title.to_string();
    let mut report_file = format!("{}.txt", kind.file_stem());

    let table = match kind {
        StatKind::Country => stats::country_table(&title, &stats::by_country(totals)),
        StatKind::Rates => metrics::rates_table(&title, &metrics::rates(totals)),
        StatKind::Descriptive => metrics::describe_table(&title, &metrics::describe(totals)),
        StatKind::Pivot => metrics::pivot_table(&title, totals),
        StatKind::Month => stats::month_table(&title, &stats::by_month(totals)),
        StatKind::Year => stats::year_table(&title, &stats::by_year(totals)),
        StatKind::Wave => metrics::wave_intensity_table(&title, totals, &params.years),
        StatKind::Range => {
            let (start, end) = params
                .range
                .ok_or(crate::error::CovidError::InvalidDate(String::new()))?;
            let changes = stats::by_date_range(totals, start, end)?;
            title = format!("Date Range {start} to {end}");
            report_file = format!("stats_by_range_{start}_to_{end}.txt");
            stats::country_table(&title, &changes)
        }
    };

    log::info!("{} generated: {} rows", kind.label(), table.len());
    Ok(StatResult {
        kind,
        table,
        description: description.to_string(),
        export_file: format!("{}.csv", kind.file_stem()),
        report_file,
    })
}
