//! SQLite storage for cleaned observations.
//!
//! Schema: a single `covid_data` table
//! - id, country, province, date (ISO-8601 text)
//! - confirmed_cases, deaths_cases, recovered_cases
//! - latitude, longitude

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection, Row};

use super::filter::Filter;
use super::models::Observation;
use crate::error::Result;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS covid_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        country TEXT NOT NULL,
        province TEXT NOT NULL,
        date TEXT NOT NULL,
        confirmed_cases INTEGER NOT NULL,
        deaths_cases INTEGER NOT NULL,
        recovered_cases INTEGER NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL
    )";

const INSERT_ROW: &str = "
    INSERT INTO covid_data (country, province, date, confirmed_cases, deaths_cases,
                            recovered_cases, latitude, longitude)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const SELECT_ROWS: &str = "
    SELECT country, province, date, confirmed_cases, deaths_cases,
           recovered_cases, latitude, longitude
    FROM covid_data
    ORDER BY country, date, id";

/// Storage interface for the case database
pub struct Storage {
    db_file: PathBuf,
}

impl Storage {
    /// Create a Storage pointing at a database file; nothing is opened yet
    pub fn new(db_file: PathBuf) -> Self {
        Storage { db_file }
    }

    pub fn db_file(&self) -> &Path {
        &self.db_file
    }

    /// Open (creating if needed) the database file
    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Connection::open(&self.db_file)?)
    }

    /// Open the database and make sure the table exists.
    ///
    /// Safe to call repeatedly: an existing table and its rows are untouched.
    pub fn connect(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute(CREATE_TABLE, [])?;
        log::info!("Table structure ensured in {:?}", self.db_file);
        Ok(())
    }

    pub fn table_exists(&self) -> Result<bool> {
        let conn = self.open()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'covid_data'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert rows in a single transaction; returns the number inserted
    pub fn insert_observations(&self, rows: &[Observation]) -> Result<usize> {
        let mut conn = self.open()?;
        conn.execute(CREATE_TABLE, [])?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(INSERT_ROW)?;
            for row in rows {
                stmt.execute(params![
                    row.country,
                    row.province,
                    row.date.format("%Y-%m-%d").to_string(),
                    row.confirmed,
                    row.deaths,
                    row.recovered,
                    row.latitude,
                    row.longitude,
                ])?;
            }
        }
        tx.commit()?;

        log::info!("Inserted {} records into {:?}", rows.len(), self.db_file);
        Ok(rows.len())
    }

    /// All stored rows ordered by country, date, insertion
    pub fn load_observations(&self) -> Result<Vec<Observation>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(SELECT_ROWS)?;
        let rows = stmt
            .query_map([], observation_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        log::info!("Loaded {} rows from {:?}", rows.len(), self.db_file);
        Ok(rows)
    }

    pub fn row_count(&self) -> Result<usize> {
        let conn = self.open()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM covid_data", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Remove every row but keep the schema
    pub fn truncate(&self) -> Result<usize> {
        let conn = self.open()?;
        let deleted = conn.execute("DELETE FROM covid_data", [])?;
        // Restart ids like TRUNCATE would; sqlite_sequence only exists after the first insert
        let has_sequence: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'",
            [],
            |row| row.get(0),
        )?;
        if has_sequence > 0 {
            conn.execute("DELETE FROM sqlite_sequence WHERE name = 'covid_data'", [])?;
        }
        log::warn!("Deleted all {deleted} records from covid_data (schema preserved)");
        Ok(deleted)
    }

    /// Delete the rows matching a filter; returns the number deleted
    pub fn delete_matching(&self, filter: &Filter) -> Result<usize> {
        let conn = self.open()?;
        let (condition, values) = filter.sql_condition();
        let deleted = conn.execute(
            &format!("DELETE FROM covid_data WHERE {condition}"),
            params_from_iter(values),
        )?;
        log::warn!("Deleted {deleted} records matching {filter}");
        Ok(deleted)
    }
}

fn observation_from_row(row: &Row) -> rusqlite::Result<Observation> {
    let date: String = row.get(2)?;
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Observation {
        country: row.get(0)?,
        province: row.get(1)?,
        date,
        confirmed: row.get(3)?,
        deaths: row.get(4)?,
        recovered: row.get(5)?,
        latitude: row.get(6)?,
        longitude: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(country: &str, date: (i32, u32, u32), confirmed: i64) -> Observation {
        Observation {
            country: country.to_string(),
            province: "Unknown".to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            confirmed,
            deaths: 1,
            recovered: 2,
            latitude: 1.5,
            longitude: -3.25,
        }
    }

    fn storage(dir: &tempfile::TempDir) -> Storage {
        Storage::new(dir.path().join("db").join("covid.db"))
    }

    #[test]
    fn test_connect_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        storage.connect().unwrap();
        storage.insert_observations(&[obs("Italy", (2021, 1, 1), 5)]).unwrap();
        storage.connect().unwrap();
        storage.connect().unwrap();

        assert!(storage.table_exists().unwrap());
        assert_eq!(storage.row_count().unwrap(), 1);

        let conn = Connection::open(storage.db_file()).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'covid_data'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_table_missing_before_connect() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!storage(&dir).table_exists().unwrap());
    }

    #[test]
    fn test_insert_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        storage.connect().unwrap();

        let rows = vec![
            obs("Italy", (2022, 3, 1), 30),
            obs("Brazil", (2021, 2, 1), 20),
            obs("Brazil", (2021, 1, 1), 10),
        ];
        assert_eq!(storage.insert_observations(&rows).unwrap(), 3);

        let loaded = storage.load_observations().unwrap();
        assert_eq!(loaded.len(), 3);
        // Ordered by country then date
        assert_eq!(loaded[0], rows[2]);
        assert_eq!(loaded[1], rows[1]);
        assert_eq!(loaded[2], rows[0]);
    }

    #[test]
    fn test_truncate_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        storage.connect().unwrap();
        storage
            .insert_observations(&[obs("Egypt", (2021, 1, 1), 1), obs("Egypt", (2021, 1, 2), 2)])
            .unwrap();

        assert_eq!(storage.truncate().unwrap(), 2);
        assert!(storage.table_exists().unwrap());
        assert_eq!(storage.row_count().unwrap(), 0);
        assert!(storage.load_observations().unwrap().is_empty());
    }

    #[test]
    fn test_truncate_restarts_ids() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        storage.connect().unwrap();

        // Nothing inserted yet, so there is no id sequence to reset
        assert_eq!(storage.truncate().unwrap(), 0);

        storage
            .insert_observations(&[obs("Egypt", (2021, 1, 1), 1), obs("Egypt", (2021, 1, 2), 2)])
            .unwrap();
        storage.truncate().unwrap();
        storage.insert_observations(&[obs("India", (2021, 1, 1), 3)]).unwrap();

        let conn = storage.open().unwrap();
        let id: i64 = conn
            .query_row("SELECT MIN(id) FROM covid_data", [], |row| row.get(0))
            .unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn test_delete_matching_filter() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        storage.connect().unwrap();
        storage
            .insert_observations(&[
                obs("Italy", (2021, 1, 1), 1),
                obs("Italy", (2022, 1, 1), 2),
                obs("India", (2022, 1, 1), 3),
            ])
            .unwrap();

        let filter = Filter::parse("2022", "", "Italy").unwrap();
        assert_eq!(storage.delete_matching(&filter).unwrap(), 1);

        let remaining = storage.load_observations().unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|r| !filter.matches(r)));
    }

    #[test]
    fn test_load_without_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(storage(&dir).load_observations().is_err());
    }
}
