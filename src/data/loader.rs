//! CSV loader for the daily COVID-19 reports.
//!
//! Each report is a file named `MM-DD-YYYY.csv`; the file name carries the
//! report date. Column names vary across report generations
//! (`Country/Region` vs `Country_Region`), so headers are normalized before
//! lookup.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;

use super::models::RawObservation;
use crate::config::IngestConfig;
use crate::error::{CovidError, Result};

const COUNTRY: &str = "Country_Region";
const PROVINCE: &str = "Province_State";
const CONFIRMED: &str = "Confirmed";
const DEATHS: &str = "Deaths";
const RECOVERED: &str = "Recovered";
const LATITUDE: &str = "Lat";
const LONGITUDE: &str = "Long_";

/// Load every report of `dir` that falls in the configured years, keeping
/// only rows of the configured countries.
pub fn load_all_csvs(dir: &Path, ingest: &IngestConfig) -> Result<Vec<RawObservation>> {
    if !dir.is_dir() {
        return Err(CovidError::MissingCsvDir(dir.to_path_buf()));
    }

    let reports = list_reports(dir)?;
    if reports.is_empty() {
        return Err(CovidError::NoReports(dir.to_path_buf()));
    }

    let mut rows = Vec::new();
    let mut files_read = 0;
    for (date, path) in reports {
        if !ingest.accepts_year(date.year()) {
            continue;
        }
        match load_report(&path, date, ingest) {
            Ok(mut report_rows) => {
                log::debug!("{path:?}: {} matching rows", report_rows.len());
                files_read += 1;
                rows.append(&mut report_rows);
            }
            Err(e) => log::warn!("Skipping {path:?}: {e}"),
        }
    }

    log::info!("Loaded {} rows from {files_read} reports in {dir:?}", rows.len());
    Ok(rows)
}

/// Report files of a directory with their dates, oldest first
fn list_reports(dir: &Path) -> Result<Vec<(NaiveDate, PathBuf)>> {
    let mut reports = Vec::new();

    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if !path.extension().map(|e| e == "csv").unwrap_or(false) {
            continue;
        }
        match path.file_stem().and_then(|s| s.to_str()).and_then(report_date) {
            Some(date) => reports.push((date, path)),
            None => log::warn!("Skipping {path:?}: file name is not a MM-DD-YYYY date"),
        }
    }

    reports.sort();
    Ok(reports)
}

/// Parse a report file stem (`MM-DD-YYYY`)
pub fn report_date(stem: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(stem, "%m-%d-%Y").ok()
}

/// Normalize a header name: trimmed, `/` and spaces become `_`
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .replace(['/', ' '], "_")
}

/// Positions of the columns used by the loader
struct Columns {
    country: usize,
    province: Option<usize>,
    confirmed: Option<usize>,
    deaths: Option<usize>,
    recovered: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Option<Self> {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |name: &str| names.iter().position(|h| h == name);

        Some(Columns {
            country: find(COUNTRY)?,
            province: find(PROVINCE),
            confirmed: find(CONFIRMED),
            deaths: find(DEATHS),
            recovered: find(RECOVERED),
            latitude: find(LATITUDE),
            longitude: find(LONGITUDE),
        })
    }
}

fn load_report(path: &Path, date: NaiveDate, ingest: &IngestConfig) -> Result<Vec<RawObservation>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers = reader.headers()?.clone();
    let columns = Columns::locate(&headers).ok_or(CovidError::MissingColumn(COUNTRY))?;

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("{path:?} row {}: {e}", line + 1);
                continue;
            }
        };

        let country = record.get(columns.country).unwrap_or("").trim();
        if !ingest.accepts_country(country) {
            continue;
        }

        rows.push(RawObservation {
            country: country.to_string(),
            province: text_cell(&record, columns.province),
            date,
            confirmed: count_cell(&record, columns.confirmed),
            deaths: count_cell(&record, columns.deaths),
            recovered: count_cell(&record, columns.recovered),
            // Reports without coordinate columns place every row at 0,0
            latitude: columns
                .latitude
                .map_or(Some(0.0), |idx| float_cell(&record, Some(idx))),
            longitude: columns
                .longitude
                .map_or(Some(0.0), |idx| float_cell(&record, Some(idx))),
        });
    }

    Ok(rows)
}

fn text_cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    let value = record.get(idx?)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn float_cell(record: &StringRecord, idx: Option<usize>) -> Option<f64> {
    record.get(idx?)?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Counts are sometimes written as floats (`"12.0"`)
fn count_cell(record: &StringRecord, idx: Option<usize>) -> Option<i64> {
    let value = record.get(idx?)?.trim();
    value
        .parse::<i64>()
        .ok()
        .or_else(|| float_cell(record, idx).map(|v| v as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODERN_HEADER: &str = "FIPS,Admin2,Province_State,Country_Region,Last_Update,Lat,Long_,Confirmed,Deaths,Recovered,Active,Combined_Key";

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn ingest() -> IngestConfig {
        IngestConfig::default()
    }

    #[test]
    fn test_report_date() {
        assert_eq!(report_date("01-31-2022"), NaiveDate::from_ymd_opt(2022, 1, 31));
        assert_eq!(report_date("2022-01-31"), None);
        assert_eq!(report_date("README"), None);
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Country/Region "), "Country_Region");
        assert_eq!(normalize_header("Province State"), "Province_State");
        assert_eq!(normalize_header("\u{feff}FIPS"), "FIPS");
    }

    #[test]
    fn test_loads_matching_countries_and_years() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "01-02-2021.csv",
            &format!(
                "{MODERN_HEADER}\n\
                 ,,Lombardia,Italy,2021-01-02,45.46,9.19,100,10,50,40,x\n\
                 ,,,Germany,2021-01-02,51.1,10.4,999,9,9,9,x\n\
                 ,,,Egypt,2021-01-02,26.8,30.8,20,2,5,13,x\n"
            ),
        );
        // Outside the configured years
        write(
            dir.path(),
            "12-31-2020.csv",
            &format!("{MODERN_HEADER}\n,,,Italy,2020-12-31,1,1,5,0,0,5,x\n"),
        );
        // Not a report
        write(dir.path(), "notes.txt", "ignore me");

        let rows = load_all_csvs(dir.path(), &ingest()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.date == NaiveDate::from_ymd_opt(2021, 1, 2).unwrap()));

        let italy = rows.iter().find(|r| r.country == "Italy").unwrap();
        assert_eq!(italy.province.as_deref(), Some("Lombardia"));
        assert_eq!(italy.confirmed, Some(100));
        assert_eq!(italy.latitude, Some(45.46));

        let egypt = rows.iter().find(|r| r.country == "Egypt").unwrap();
        assert_eq!(egypt.province, None);
    }

    #[test]
    fn test_missing_values_stay_missing() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "03-01-2022.csv",
            &format!("{MODERN_HEADER}\n,,,Brazil,2022-03-01,,,12.0,,abc,0,x\n"),
        );

        let rows = load_all_csvs(dir.path(), &ingest()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.confirmed, Some(12));
        assert_eq!(row.deaths, None);
        assert_eq!(row.recovered, None);
        assert_eq!(row.latitude, None);
        assert_eq!(row.longitude, None);
    }

    #[test]
    fn test_legacy_headers_without_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "02-01-2021.csv",
            "Province/State,Country/Region,Last Update,Confirmed,Deaths,Recovered\n\
             ,India,2021-02-01,7,1,3\n",
        );

        let rows = load_all_csvs(dir.path(), &ingest()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, "India");
        assert_eq!(rows[0].latitude, Some(0.0));
        assert_eq!(rows[0].longitude, Some(0.0));
    }

    #[test]
    fn test_rows_follow_report_date_order() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "01-02-2022.csv",
            &format!("{MODERN_HEADER}\n,,,Italy,x,1,1,2,0,0,0,x\n"),
        );
        write(
            dir.path(),
            "12-30-2021.csv",
            &format!("{MODERN_HEADER}\n,,,Italy,x,1,1,1,0,0,0,x\n"),
        );

        let rows = load_all_csvs(dir.path(), &ingest()).unwrap();
        let confirmed: Vec<Option<i64>> = rows.iter().map(|r| r.confirmed).collect();
        assert_eq!(confirmed, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_report_without_country_column_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "01-01-2021.csv", "Province,Confirmed\nX,1\n");
        write(
            dir.path(),
            "01-02-2021.csv",
            &format!("{MODERN_HEADER}\n,,,Russia,x,1,1,4,0,0,0,x\n"),
        );

        let rows = load_all_csvs(dir.path(), &ingest()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, "Russia");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_all_csvs(&dir.path().join("absent"), &ingest());
        assert!(matches!(result, Err(CovidError::MissingCsvDir(_))));
    }

    #[test]
    fn test_directory_without_reports_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "readme.md", "nothing here");
        let result = load_all_csvs(dir.path(), &ingest());
        assert!(matches!(result, Err(CovidError::NoReports(_))));
    }
}
