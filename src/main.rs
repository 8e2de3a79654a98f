//! covid-tui: a terminal dashboard for the JHU COVID-19 daily reports
//!
//! Loads the CSV reports, cleans them into a SQLite table, and derives
//! statistics, CSV exports, text reports and SVG charts from the stored rows,
//! either interactively or through headless subcommands.

mod analysis;
mod app;
mod cli;
mod config;
mod data;
mod error;
mod export;
mod plot;
mod session;
mod ui;

use std::fs::{self, File};

use anyhow::{bail, Context, Result};
use env_logger::{Env, Target};

use crate::analysis::Table;
use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::Settings;
use crate::session::{Session, Severity, Status};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();
    let settings = cli.settings().context("Failed to load configuration")?;

    init_logging(&settings, cli.is_interactive())?;
    log::info!("Database: {:?}", settings.database.db_file());

    match cli.command {
        None | Some(Commands::Show { .. }) => app::run(settings)?,
        Some(Commands::Ingest { clear }) => ingest(settings, clear)?,
        Some(Commands::Stats {
            kind,
            filter,
            start,
            end,
            export,
            report,
            format,
        }) => {
            let mut session = load_view(settings, filter.to_filter())?;
            print_status(session.generate_stat(kind, &start, &end)?)?;
            if export {
                print_status(session.export_stat()?)?;
            }
            if report {
                print_status(session.save_report()?)?;
            }
            if let Some(stat) = session.last_stat() {
                print_table(&stat.table, format)?;
            }
        }
        Some(Commands::Plot { kind, filter }) => {
            let mut session = load_view(settings, filter.to_filter())?;
            print_status(session.render_plot(kind)?)?;
            if let Some((_, path)) = session.last_plot() {
                println!("{}", path.display());
            }
        }
        Some(Commands::Clear { filter }) => {
            let mut session = Session::new(settings);
            print_status(session.delete_rows(&filter.to_filter())?)?;
        }
    }

    Ok(())
}

/// Log to stderr, or to a file while the dashboard owns the terminal
fn init_logging(settings: &Settings, interactive: bool) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if interactive {
        let path = settings.paths.log_file();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create {dir:?}"))?;
        }
        let file = File::create(&path).with_context(|| format!("Failed to open log file {path:?}"))?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn ingest(settings: Settings, clear: bool) -> Result<()> {
    let mut session = Session::new(settings);
    print_status(session.connect()?)?;
    if clear {
        print_status(session.clear_table()?)?;
    }
    print_status(session.load_csv()?)?;
    print_status(session.clean()?)?;
    print_status(session.insert()?)
}

/// Load the stored rows and narrow them to `filter`
fn load_view(settings: Settings, filter: data::Filter) -> Result<Session> {
    let mut session = Session::new(settings);
    print_status(session.load_from_db()?)?;
    if !filter.is_empty() {
        print_status(session.apply_filter(filter)?)?;
    }
    Ok(session)
}

/// Echo a status; warnings stop a headless run
fn print_status(status: Status) -> Result<()> {
    match status.severity {
        Severity::Info | Severity::Success => {
            eprintln!("{}", status.message);
            Ok(())
        }
        Severity::Warning | Severity::Error => bail!("{}", status.message),
    }
}

fn print_table(table: &Table, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Markdown => println!("{}\n\n{}", table.title, export::markdown_table(table)),
        OutputFormat::Json => {
            let records = table
                .rows
                .iter()
                .map(|row| {
                    table
                        .columns
                        .iter()
                        .cloned()
                        .zip(row.iter().map(serde_json::to_value))
                        .map(|(column, value)| value.map(|v| (column, v)))
                        .collect::<Result<serde_json::Map<_, _>, _>>()
                })
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to serialize table")?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}
