//! In-memory working state behind the dashboard and the headless commands.
//!
//! A session holds the rows at each pipeline stage (read from CSV, cleaned,
//! loaded from the database, filtered) and turns user actions into calls to
//! the data, analysis, export and plot layers. Actions return a [`Status`]
//! for the status line; missing prerequisites are warnings, not errors.

use std::path::PathBuf;

use chrono::Local;

use crate::analysis::{self, stats, Table};
use crate::analysis::{StatKind, StatParams, StatResult};
use crate::config::Settings;
use crate::data::{cleaning, daily_totals, loader};
use crate::data::{DailyTotal, Filter, Observation, RawObservation, Storage};
use crate::error::Result;
use crate::export;
use crate::plot::{self, PlotKind};

/// How a status message is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Outcome of a session action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub severity: Severity,
    pub message: String,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Status {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Status {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Status {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Status {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

pub struct Session {
    settings: Settings,
    storage: Storage,
    raw: Option<Vec<RawObservation>>,
    cleaned: Option<Vec<Observation>>,
    loaded: Option<Vec<Observation>>,
    filter: Filter,
    filtered: Option<Vec<Observation>>,
    /// Daily totals of the rows statistics and charts run on
    totals: Vec<DailyTotal>,
    last_stat: Option<StatResult>,
    last_plot: Option<(PlotKind, PathBuf)>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        let storage = Storage::new(settings.database.db_file());
        Session {
            settings,
            storage,
            raw: None,
            cleaned: None,
            loaded: None,
            filter: Filter::default(),
            filtered: None,
            totals: Vec::new(),
            last_stat: None,
            last_plot: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn raw(&self) -> Option<&[RawObservation]> {
        self.raw.as_deref()
    }

    pub fn cleaned(&self) -> Option<&[Observation]> {
        self.cleaned.as_deref()
    }

    pub fn loaded(&self) -> Option<&[Observation]> {
        self.loaded.as_deref()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Rows statistics and charts use: the filtered view when a filter is active
    pub fn analysis_rows(&self) -> Option<&[Observation]> {
        self.filtered.as_deref().or(self.loaded.as_deref())
    }

    pub fn totals(&self) -> &[DailyTotal] {
        &self.totals
    }

    pub fn last_stat(&self) -> Option<&StatResult> {
        self.last_stat.as_ref()
    }

    pub fn last_plot(&self) -> Option<&(PlotKind, PathBuf)> {
        self.last_plot.as_ref()
    }

    /// Open the database and create the table if it is missing
    pub fn connect(&mut self) -> Result<Status> {
        let existed = self.storage.table_exists()?;
        self.storage.connect()?;
        let n = self.storage.row_count()?;
        log::info!("Connected to {:?}, {n} rows stored", self.storage.db_file());
        let action = if existed { "verified" } else { "created" };
        Ok(Status::success(format!(
            "Connected and {action} table schema. {n} rows stored."
        )))
    }

    pub fn load_csv(&mut self) -> Result<Status> {
        let rows = loader::load_all_csvs(&self.settings.paths.csv_dir, &self.settings.ingest)?;
        let n = rows.len();
        self.raw = Some(rows);
        self.cleaned = None;
        Ok(Status::success(format!("Loaded {n} rows from CSVs.")))
    }

    pub fn clean(&mut self) -> Result<Status> {
        let Some(raw) = self.raw.take() else {
            return Ok(Status::warning("No data loaded yet."));
        };
        let (rows, report) = cleaning::clean(raw);
        let n = rows.len();
        self.cleaned = Some(rows);
        Ok(Status::success(format!(
            "Cleaned data. {n} rows ready, {} values imputed.",
            report.total_imputed()
        )))
    }

    pub fn insert(&mut self) -> Result<Status> {
        let Some(rows) = &self.cleaned else {
            if self.raw.is_some() {
                return Ok(Status::warning("Clean the data before inserting it."));
            }
            return Ok(Status::warning("No data to insert."));
        };
        self.storage.connect()?;
        let n = self.storage.insert_observations(rows)?;
        Ok(Status::success(format!("Inserted {n} rows into the database.")))
    }

    pub fn clear_table(&mut self) -> Result<Status> {
        self.storage.connect()?;
        let n = self.storage.truncate()?;
        log::info!("Cleared {n} rows from covid_data");
        Ok(Status::info("All data cleared from covid_data table."))
    }

    /// Delete the stored rows matching `filter`; an empty filter clears the table
    pub fn delete_rows(&mut self, filter: &Filter) -> Result<Status> {
        if filter.is_empty() {
            return self.clear_table();
        }
        self.storage.connect()?;
        let n = self.storage.delete_matching(filter)?;
        Ok(Status::info(format!("Deleted {n} rows matching {filter}.")))
    }

    pub fn load_from_db(&mut self) -> Result<Status> {
        self.storage.connect()?;
        let rows = self.storage.load_observations()?;
        let n = rows.len();
        self.filtered = (!self.filter.is_empty()).then(|| self.filter.apply(&rows));
        self.loaded = Some(rows);
        self.refresh_totals();
        Ok(Status::success(format!("Loaded {n} rows from the database.")))
    }

    pub fn apply_filter(&mut self, filter: Filter) -> Result<Status> {
        let Some(rows) = &self.loaded else {
            return Ok(Status::warning("No data loaded yet."));
        };
        let filtered = filter.apply(rows);
        let n = filtered.len();
        log::info!("Filter {filter}: {n} rows");
        self.filtered = (!filter.is_empty()).then_some(filtered);
        self.filter = filter;
        self.refresh_totals();
        Ok(Status::success(format!("Filtered {n} rows.")))
    }

    pub fn clear_filter(&mut self) -> Status {
        self.filter = Filter::default();
        self.filtered = None;
        self.refresh_totals();
        Status::info("Filter cleared.")
    }

    /// Warning to show when there is nothing to analyse
    fn require_rows(&self) -> Option<Status> {
        match self.analysis_rows() {
            None => Some(Status::warning("Please load data first.")),
            Some([]) if !self.filter.is_empty() => {
                Some(Status::warning("No rows match the current filter."))
            }
            Some([]) => Some(Status::warning("The database holds no rows.")),
            Some(_) => None,
        }
    }

    fn refresh_totals(&mut self) {
        self.totals = self.analysis_rows().map(daily_totals).unwrap_or_default();
    }

    /// Compute a statistic; `start` and `end` are only read for the date range
    pub fn generate_stat(&mut self, kind: StatKind, start: &str, end: &str) -> Result<Status> {
        if let Some(status) = self.require_rows() {
            return Ok(status);
        }

        let range = if kind.needs_range() {
            Some((stats::parse_date(start)?, stats::parse_date(end)?))
        } else {
            None
        };
        let params = StatParams {
            years: self.settings.ingest.years(),
            range,
        };

        let result = analysis::compute(kind, &self.totals, &params)?;
        let status = Status::success(format!(
            "{} generated: {} rows.",
            kind.label(),
            result.table.len()
        ));
        self.last_stat = Some(result);
        Ok(status)
    }

    pub fn export_stat(&self) -> Result<Status> {
        let Some(stat) = &self.last_stat else {
            return Ok(Status::warning("Generate a statistic first."));
        };
        export::export_csv(&stat.table, &stat.export_file, &self.settings.paths)?;
        Ok(Status::success(format!(
            "Exported {} to {}.",
            stat.kind.label(),
            stat.export_file
        )))
    }

    pub fn save_report(&self) -> Result<Status> {
        let Some(stat) = &self.last_stat else {
            return Ok(Status::warning("Generate a statistic first."));
        };
        export::save_report(
            &stat.table,
            &stat.report_file,
            &self.settings.paths,
            Some(&stat.description),
            Local::now().naive_local(),
        )?;
        Ok(Status::success(format!("Report for {} saved.", stat.kind.label())))
    }

    pub fn render_plot(&mut self, kind: PlotKind) -> Result<Status> {
        if let Some(status) = self.require_rows() {
            return Ok(status);
        }
        let path = plot::render(kind, &self.totals, &self.settings)?;
        self.last_plot = Some((kind, path));
        Ok(Status::success(format!("Plot saved as {}", kind.file_name())))
    }
}

/// Rows read from CSV, missing values shown blank
pub fn raw_table(rows: &[RawObservation]) -> Table {
    let mut table = Table::new("Raw data", OBSERVATION_COLUMNS);
    for r in rows {
        table.push(vec![
            r.country.as_str().into(),
            r.province.clone().map_or(analysis::Cell::Empty, Into::into),
            r.date.into(),
            r.confirmed.map_or(analysis::Cell::Empty, Into::into),
            r.deaths.map_or(analysis::Cell::Empty, Into::into),
            r.recovered.map_or(analysis::Cell::Empty, Into::into),
            r.latitude.map_or(analysis::Cell::Empty, Into::into),
            r.longitude.map_or(analysis::Cell::Empty, Into::into),
        ]);
    }
    table
}

pub fn observation_table(title: &str, rows: &[Observation]) -> Table {
    let mut table = Table::new(title, OBSERVATION_COLUMNS);
    for r in rows {
        table.push(vec![
            r.country.as_str().into(),
            r.province.as_str().into(),
            r.date.into(),
            r.confirmed.into(),
            r.deaths.into(),
            r.recovered.into(),
            r.latitude.into(),
            r.longitude.into(),
        ]);
    }
    table
}

const OBSERVATION_COLUMNS: [&str; 8] = [
    "country",
    "province",
    "date",
    "confirmed_cases",
    "deaths_cases",
    "recovered_cases",
    "latitude",
    "longitude",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    const HEADER: &str = "Province_State,Country_Region,Last_Update,Lat,Long_,Confirmed,Deaths,Recovered";

    fn write_reports(dir: &Path) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(
            dir.join("01-01-2021.csv"),
            format!("{HEADER}\n,Italy,x,41.8,12.5,100,10,50\n,Egypt,x,26.8,30.8,20,,5\nLazio,Atlantis,x,0,0,1,1,1\n"),
        )
        .unwrap();
        std::fs::write(
            dir.join("02-01-2021.csv"),
            format!("{HEADER}\n,Italy,x,41.8,12.5,160,13,70\n,Egypt,x,,,50,3,9\n"),
        )
        .unwrap();
        std::fs::write(
            dir.join("01-01-2022.csv"),
            format!("{HEADER}\n,Italy,x,41.8,12.5,400,20,300\n"),
        )
        .unwrap();
    }

    fn session() -> (TempDir, Session) {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.paths.csv_dir = dir.path().join("reports");
        settings.paths.base_dir = dir.path().to_path_buf();
        settings.database.dir = dir.path().join("db");
        write_reports(&settings.paths.csv_dir);
        (dir, Session::new(settings))
    }

    fn ingested() -> (TempDir, Session) {
        let (dir, mut session) = session();
        session.connect().unwrap();
        session.load_csv().unwrap();
        session.clean().unwrap();
        session.insert().unwrap();
        session.load_from_db().unwrap();
        (dir, session)
    }

    #[test]
    fn test_connect_is_idempotent() {
        let (_dir, mut session) = ingested();
        let status = session.connect().unwrap();
        assert_eq!(status.message, "Connected and verified table schema. 5 rows stored.");
        session.connect().unwrap();
        session.load_from_db().unwrap();
        assert_eq!(session.loaded().unwrap().len(), 5);
    }

    #[test]
    fn test_actions_without_data_warn() {
        let (_dir, mut session) = session();
        assert_eq!(session.clean().unwrap().severity, Severity::Warning);
        assert_eq!(session.insert().unwrap().severity, Severity::Warning);
        assert_eq!(
            session.apply_filter(Filter::default()).unwrap().severity,
            Severity::Warning
        );
        assert_eq!(
            session.generate_stat(StatKind::Country, "", "").unwrap().severity,
            Severity::Warning
        );
        assert_eq!(session.export_stat().unwrap().severity, Severity::Warning);
        assert_eq!(
            session.render_plot(PlotKind::Bar).unwrap().severity,
            Severity::Warning
        );
    }

    #[test]
    fn test_insert_requires_cleaning() {
        let (_dir, mut session) = session();
        session.load_csv().unwrap();
        let status = session.insert().unwrap();
        assert_eq!(status.severity, Severity::Warning);
        assert!(status.message.contains("Clean"));
    }

    #[test]
    fn test_pipeline_counts() {
        let (_dir, mut session) = session();
        session.connect().unwrap();
        let status = session.load_csv().unwrap();
        assert_eq!(status.message, "Loaded 5 rows from CSVs.");
        assert!(session.raw().unwrap().iter().any(|r| r.deaths.is_none()));

        session.clean().unwrap();
        assert!(session.raw().is_none());
        assert_eq!(session.cleaned().unwrap().len(), 5);

        let status = session.insert().unwrap();
        assert_eq!(status.message, "Inserted 5 rows into the database.");
    }

    #[test]
    fn test_filter_drives_statistics() {
        let (_dir, mut session) = ingested();

        session
            .apply_filter(Filter::parse("2021", "", "Italy").unwrap())
            .unwrap();
        assert_eq!(session.analysis_rows().unwrap().len(), 2);
        session.generate_stat(StatKind::Country, "", "").unwrap();
        let table = &session.last_stat().unwrap().table;
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0][1], analysis::Cell::Int(160));

        session.clear_filter();
        assert_eq!(session.analysis_rows().unwrap().len(), 5);
        session.generate_stat(StatKind::Country, "", "").unwrap();
        let table = &session.last_stat().unwrap().table;
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_empty_filter_result_warns() {
        let (_dir, mut session) = ingested();
        let status = session
            .apply_filter(Filter::parse("2023", "", "").unwrap())
            .unwrap();
        assert_eq!(status.message, "Filtered 0 rows.");

        let status = session.generate_stat(StatKind::Country, "", "").unwrap();
        assert_eq!(status.severity, Severity::Warning);
        assert_eq!(status.message, "No rows match the current filter.");
        assert!(session.last_stat().is_none());

        let status = session.render_plot(PlotKind::Bar).unwrap();
        assert_eq!(status.severity, Severity::Warning);
        assert!(session.last_plot().is_none());
    }

    #[test]
    fn test_empty_database_warns() {
        let (_dir, mut session) = session();
        session.load_from_db().unwrap();
        let status = session.render_plot(PlotKind::Line).unwrap();
        assert_eq!(status.severity, Severity::Warning);
        assert_eq!(status.message, "The database holds no rows.");
    }

    #[test]
    fn test_filter_survives_reload() {
        let (_dir, mut session) = ingested();
        session
            .apply_filter(Filter::parse("", "", "Egypt").unwrap())
            .unwrap();
        session.load_from_db().unwrap();
        assert_eq!(session.analysis_rows().unwrap().len(), 2);
    }

    #[test]
    fn test_date_range_errors() {
        let (_dir, mut session) = ingested();
        assert!(session
            .generate_stat(StatKind::Range, "2021-13-01", "2022-01-01")
            .is_err());
        assert!(session
            .generate_stat(StatKind::Range, "2022-01-01", "2021-01-01")
            .is_err());
        let status = session
            .generate_stat(StatKind::Range, "2021-01-01", "2021-02-01")
            .unwrap();
        assert_eq!(status.message, "Date Range generated: 2 rows.");
    }

    #[test]
    fn test_export_report_and_plot_files() {
        let (dir, mut session) = ingested();
        session.generate_stat(StatKind::Country, "", "").unwrap();
        session.export_stat().unwrap();
        session.save_report().unwrap();
        session.render_plot(PlotKind::Line).unwrap();

        assert!(dir.path().join("Output/exports/stats_by_country.csv").exists());
        let report =
            std::fs::read_to_string(dir.path().join("Output/reports/stats_by_country.txt")).unwrap();
        assert!(report.contains("Total Confirmed Cases:  450"));
        assert_eq!(
            session.last_plot().unwrap().1,
            dir.path().join("Graphics/line_trend_by_country.svg")
        );
    }

    #[test]
    fn test_clear_table() {
        let (_dir, mut session) = ingested();
        session.clear_table().unwrap();
        session.load_from_db().unwrap();
        assert!(session.loaded().unwrap().is_empty());
    }

    #[test]
    fn test_delete_matching_rows() {
        let (_dir, mut session) = ingested();
        let filter = Filter::parse("2021", "", "Italy").unwrap();
        let status = session.delete_rows(&filter).unwrap();
        assert_eq!(status.message, "Deleted 2 rows matching year=2021, country=Italy.");
        session.load_from_db().unwrap();
        assert_eq!(session.loaded().unwrap().len(), 3);

        let status = session.connect().unwrap();
        assert!(status.message.ends_with("3 rows stored."));
    }

    #[test]
    fn test_tables_for_display() {
        let (_dir, mut session) = session();
        session.load_csv().unwrap();
        let raw = raw_table(session.raw().unwrap());
        assert_eq!(raw.len(), 5);
        assert!(raw.rows.iter().any(|row| row[4] == analysis::Cell::Empty));

        session.clean().unwrap();
        let clean = observation_table("Cleaned data", session.cleaned().unwrap());
        assert!(clean.rows.iter().all(|row| row.iter().all(|c| *c != analysis::Cell::Empty)));
    }
}
