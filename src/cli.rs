//! Command-line interface argument parsing for covid-tui.
//!
//! Without a subcommand the dashboard is launched:
//! - `covid-tui` or `covid-tui show`
//! - `covid-tui ingest --clear`
//! - `covid-tui stats rates --year 2021 --country Italy --report`
//! - `covid-tui plot line --month 3`
//! - `covid-tui clear --country Egypt`

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::analysis::StatKind;
use crate::config::Settings;
use crate::data::Filter;
use crate::error::Result;
use crate::plot::PlotKind;

/// Terminal dashboard for the JHU COVID-19 daily reports.
///
/// Loads the CSV reports, cleans them into SQLite, and produces statistics,
/// CSV exports, text reports and SVG charts.
#[derive(Parser, Debug)]
#[command(name = "covid-tui")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML); defaults to ./covid-tui.toml when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the SQLite database
    #[arg(long, global = true)]
    pub db_dir: Option<PathBuf>,

    /// Root directory for Output/ and Graphics/
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Folder with the MM-DD-YYYY.csv daily reports
    #[arg(long, global = true)]
    pub csv_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the TUI dashboard
    Show {
        /// Comma-separated hex color palette for chart series
        /// Example: "#FF0000,#00FF00,#0000FF"
        #[arg(short = 'p', long)]
        color_palette: Option<String>,
    },

    /// Load, clean and insert the CSV reports into the database
    Ingest {
        /// Empty the table before inserting
        #[arg(long)]
        clear: bool,
    },

    /// Compute a statistic from the stored data
    Stats {
        #[arg(value_enum)]
        kind: StatKind,

        #[command(flatten)]
        filter: FilterArgs,

        /// First day of the date range statistic (YYYY-MM-DD)
        #[arg(long, default_value = "")]
        start: String,

        /// Last day of the date range statistic (YYYY-MM-DD)
        #[arg(long, default_value = "")]
        end: String,

        /// Also write the table to Output/exports
        #[arg(long)]
        export: bool,

        /// Also write a text report to Output/reports
        #[arg(long)]
        report: bool,

        /// Format of the table printed to stdout
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },

    /// Render a chart of the stored data as SVG
    Plot {
        #[arg(value_enum)]
        kind: PlotKind,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Delete stored rows: all of them, or those matching the filters
    Clear {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

/// Year / month / country restriction shared by `stats`, `plot` and `clear`
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    #[arg(long)]
    pub country: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Filter {
        Filter {
            year: self.year,
            month: self.month,
            country: self.country.clone(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Json,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// The dashboard runs when no subcommand is given
    pub fn is_interactive(&self) -> bool {
        matches!(self.command, None | Some(Commands::Show { .. }))
    }

    /// Load the configuration and apply command-line overrides on top
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        self.apply_overrides(&mut settings);
        settings.validate()?;
        Ok(settings)
    }

    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(dir) = &self.db_dir {
            settings.database.dir = dir.clone();
        }
        if let Some(dir) = &self.base_dir {
            settings.paths.base_dir = dir.clone();
        }
        if let Some(dir) = &self.csv_dir {
            settings.paths.csv_dir = dir.clone();
        }
        if let Some(Commands::Show {
            color_palette: Some(palette),
        }) = &self.command
        {
            settings.interface.color_palette =
                palette.split(',').map(|s| s.trim().to_string()).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_is_interactive() {
        let cli = Cli::try_parse_from(["covid-tui"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.is_interactive());

        let cli = Cli::try_parse_from(["covid-tui", "clear"]).unwrap();
        assert!(!cli.is_interactive());
    }

    #[test]
    fn test_custom_colors() {
        let cli =
            Cli::try_parse_from(["covid-tui", "show", "--color-palette", "#FF0000, #00FF00"]).unwrap();
        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.interface.color_palette, vec!["#FF0000", "#00FF00"]);
    }

    #[test]
    fn test_global_paths_override_settings() {
        let cli = Cli::try_parse_from([
            "covid-tui",
            "ingest",
            "--clear",
            "--db-dir",
            "/tmp/db",
            "--csv-dir",
            "/tmp/reports",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Ingest { clear: true })));

        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.database.dir, PathBuf::from("/tmp/db"));
        assert_eq!(settings.paths.csv_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(settings.paths.base_dir, PathBuf::from("."));
    }

    #[test]
    fn test_stats_arguments() {
        let cli = Cli::try_parse_from([
            "covid-tui", "stats", "range", "--start", "2021-01-01", "--end", "2021-02-01",
            "--country", "Italy", "--format", "json", "--report",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Stats {
                kind,
                filter,
                start,
                end,
                export,
                report,
                format,
            }) => {
                assert_eq!(kind, StatKind::Range);
                assert_eq!(start, "2021-01-01");
                assert_eq!(end, "2021-02-01");
                assert!(!export);
                assert!(report);
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(filter.to_filter().country.as_deref(), Some("Italy"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_month_must_be_in_range() {
        assert!(Cli::try_parse_from(["covid-tui", "plot", "bar", "--month", "13"]).is_err());
        let cli = Cli::try_parse_from(["covid-tui", "plot", "bar", "--month", "12"]).unwrap();
        match cli.command {
            Some(Commands::Plot { kind, filter }) => {
                assert_eq!(kind, PlotKind::Bar);
                assert_eq!(filter.month, Some(12));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
