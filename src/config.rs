//! Settings for covid-tui.
//!
//! Settings are layered, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. The TOML configuration file
//! 3. Environment variables (`COVID_TUI_<SECTION>__<KEY>`)
//! 4. Command-line flags (merged by [`crate::cli`])

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CovidError, Result};

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "covid-tui.toml";

/// Prefix of environment variable overrides
const ENV_PREFIX: &str = "COVID_TUI";

/// Root settings structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub paths: PathsConfig,
    pub ingest: IngestConfig,
    pub interface: InterfaceConfig,
}

/// Location of the SQLite database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file stem; the file is `<dir>/<name>.db`
    pub name: String,
    pub dir: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            name: "covid".to_string(),
            dir: PathBuf::from("."),
        }
    }
}

impl DatabaseConfig {
    pub fn db_file(&self) -> PathBuf {
        self.dir.join(format!("{}.db", self.name))
    }
}

/// Input and output directories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Folder holding the `MM-DD-YYYY.csv` daily reports
    pub csv_dir: PathBuf,
    /// Root of `Output/exports`, `Output/reports` and `Graphics`
    pub base_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            csv_dir: PathBuf::from("Data/csse_covid_19_daily_reports"),
            base_dir: PathBuf::from("."),
        }
    }
}

impl PathsConfig {
    pub fn exports_dir(&self) -> PathBuf {
        self.base_dir.join("Output").join("exports")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.base_dir.join("Output").join("reports")
    }

    pub fn graphics_dir(&self) -> PathBuf {
        self.base_dir.join("Graphics")
    }

    pub fn log_file(&self) -> PathBuf {
        self.base_dir.join("covid-tui.log")
    }
}

/// Which reports and countries are ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub countries: Vec<String>,
    pub first_year: i32,
    pub last_year: i32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            countries: [
                "India",
                "Brazil",
                "Russia",
                "United Kingdom",
                "Egypt",
                "Italy",
                "South Africa",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            first_year: 2021,
            last_year: 2023,
        }
    }
}

impl IngestConfig {
    pub fn accepts_year(&self, year: i32) -> bool {
        (self.first_year..=self.last_year).contains(&year)
    }

    pub fn accepts_country(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c == country)
    }

    pub fn years(&self) -> Vec<i32> {
        (self.first_year..=self.last_year).collect()
    }
}

/// Dashboard appearance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    /// Hex colours (`#RRGGBB`) for chart series; empty uses the built-in palette
    pub color_palette: Vec<String>,
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    ///
    /// When `path` is `None`, `covid-tui.toml` in the working directory is
    /// used if present, then `<config dir>/covid-tui/covid-tui.toml`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Settings::default())?);

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CovidError::Config(format!(
                        "configuration file not found: {path:?}"
                    )));
                }
                builder = builder
                    .add_source(::config::File::from(path).format(::config::FileFormat::Toml));
            }
            None => {
                if let Some(found) = default_config_path() {
                    log::debug!("Using configuration file {found:?}");
                    builder = builder
                        .add_source(::config::File::from(found).format(::config::FileFormat::Toml));
                }
            }
        }

        let settings: Settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.database.name.trim().is_empty() {
            return Err(CovidError::Config("database.name must not be empty".into()));
        }
        if self.ingest.first_year > self.ingest.last_year {
            return Err(CovidError::Config(format!(
                "ingest.first_year ({}) is after ingest.last_year ({})",
                self.ingest.first_year, self.ingest.last_year
            )));
        }
        if self.ingest.countries.is_empty() {
            return Err(CovidError::Config("ingest.countries must not be empty".into()));
        }
        for color in &self.interface.color_palette {
            if parse_hex_color(color).is_none() {
                return Err(CovidError::Config(format!(
                    "interface.color_palette: '{color}' is not a #RRGGBB colour"
                )));
            }
        }
        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("covid-tui").join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.exists())
}

/// Parse `#RRGGBB` into its components
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
