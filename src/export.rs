//! Writing result tables to CSV exports and plain-text reports.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::analysis::stats::COUNT_COLUMNS;
use crate::analysis::{Cell, Table};
use crate::config::PathsConfig;
use crate::error::Result;

/// Columns that mark a table as a time series; reports on those get no summary
const DATED_COLUMNS: [&str; 3] = ["date", "year", "month_year"];

const RULE: &str = "------------------------------------------------------------";

/// Write `table` to `<base_dir>/Output/exports/<file_name>`
pub fn export_csv(table: &Table, file_name: &str, paths: &PathsConfig) -> Result<PathBuf> {
    let dir = paths.exports_dir();
    fs::create_dir_all(&dir)?;
    let path = dir.join(file_name);

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer.flush()?;

    log::info!("CSV export saved to {}", path.display());
    Ok(path)
}

/// Write a titled report with a markdown table to `<base_dir>/Output/reports/<file_name>`
pub fn save_report(
    table: &Table,
    file_name: &str,
    paths: &PathsConfig,
    description: Option<&str>,
    generated_at: NaiveDateTime,
) -> Result<PathBuf> {
    let dir = paths.reports_dir();
    fs::create_dir_all(&dir)?;
    let path = dir.join(file_name);

    fs::write(&path, render_report(table, description, generated_at))?;
    log::info!("Report saved to {}", path.display());
    Ok(path)
}

fn render_report(table: &Table, description: Option<&str>, generated_at: NaiveDateTime) -> String {
    let mut out = format!(
        "{}\nGenerated on: {}\n",
        table.title,
        generated_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "\n{description}");
    }
    out.push('\n');
    out.push_str(&markdown_table(table));
    if let Some(summary) = summary(table) {
        out.push_str(&summary);
    }
    out
}

/// GitHub-flavoured markdown table; numeric columns are right aligned
pub fn markdown_table(table: &Table) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();

    let columns: Vec<(usize, bool)> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let width = cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0);
            let numeric = table.rows.iter().all(|row| {
                matches!(row.get(i), Some(Cell::Int(_) | Cell::Float(_) | Cell::Empty) | None)
            });
            (width, numeric)
        })
        .collect();

    let line = |values: &mut dyn Iterator<Item = &str>| -> String {
        let mut out = String::from("|");
        for (value, &(width, numeric)) in values.zip(&columns) {
            if numeric {
                let _ = write!(out, " {value:>width$} |");
            } else {
                let _ = write!(out, " {value:<width$} |");
            }
        }
        out
    };

    let mut lines = vec![line(&mut table.columns.iter().map(String::as_str))];
    let mut rule = String::from("|");
    for &(width, _) in &columns {
        rule.push_str(&"-".repeat(width + 2));
        rule.push('|');
    }
    lines.push(rule);
    for row in &cells {
        lines.push(line(&mut row.iter().map(String::as_str)));
    }
    lines.join("\n")
}

/// Totals and top countries for per-country tables
fn summary(table: &Table) -> Option<String> {
    let has_counts = std::iter::once("country")
        .chain(COUNT_COLUMNS)
        .all(|c| table.has_column(c));
    if !has_counts || DATED_COLUMNS.iter().any(|c| table.has_column(c)) {
        return None;
    }

    let sum = |column: &str| -> i64 { table.column(column).filter_map(Cell::as_i64).sum() };
    let mut out = format!("\n{RULE}\n");
    let _ = writeln!(out, "Total Confirmed Cases:  {}", thousands(sum(COUNT_COLUMNS[0])));
    let _ = writeln!(out, "Total Deaths:           {}", thousands(sum(COUNT_COLUMNS[1])));
    let _ = writeln!(out, "Total Recoveries:       {}", thousands(sum(COUNT_COLUMNS[2])));

    let mut ranked: Vec<(String, i64)> = table
        .column("country")
        .map(ToString::to_string)
        .zip(table.column(COUNT_COLUMNS[0]).map(|c| c.as_i64().unwrap_or(0)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    out.push_str("\nTop 3 countries by confirmed cases:\n");
    for (rank, (country, confirmed)) in ranked.iter().take(3).enumerate() {
        let _ = writeln!(out, "{}. {country:<12} - {}", rank + 1, thousands(*confirmed));
    }
    Some(out)
}

/// `1234567` -> `1,234,567`
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Path of a file relative to `base`, for status messages
pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn country_table() -> Table {
        let mut table = Table::new(
            "Stats by Country",
            ["country", "confirmed_cases", "deaths_cases", "recovered_cases"],
        );
        for (country, c, d, r) in [
            ("Egypt", 30i64, 2i64, 9i64),
            ("Italy", 1_200_000, 20_000, 900_000),
            ("Brazil", 5_000, 100, 4_000),
            ("Canada", 700, 10, 600),
        ] {
            table.push(vec![country.into(), c.into(), d.into(), r.into()]);
        }
        table
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 0)
            .unwrap()
    }

    fn paths(base: &Path) -> PathsConfig {
        PathsConfig {
            base_dir: base.to_path_buf(),
            ..PathsConfig::default()
        }
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
        assert_eq!(thousands(-45_000), "-45,000");
    }

    #[test]
    fn test_export_csv_writes_to_exports_dir() {
        let dir = tempdir().unwrap();
        let path = export_csv(&country_table(), "stats_by_country.csv", &paths(dir.path())).unwrap();

        assert_eq!(path, dir.path().join("Output/exports/stats_by_country.csv"));
        let content = fs::read_to_string(path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("country,confirmed_cases,deaths_cases,recovered_cases")
        );
        assert_eq!(lines.next(), Some("Egypt,30,2,9"));
        assert_eq!(content.lines().count(), 5);
    }

    #[test]
    fn test_markdown_table_alignment() {
        let mut table = Table::new("t", ["country", "n"]);
        table.push(vec!["Italy".into(), 5i64.into()]);
        table.push(vec!["UK".into(), 1234i64.into()]);

        let expected = "\
| country |    n |
|---------|------|
| Italy   |    5 |
| UK      | 1234 |";
        assert_eq!(markdown_table(&table), expected);
    }

    #[test]
    fn test_report_with_summary() {
        let dir = tempdir().unwrap();
        let path = save_report(
            &country_table(),
            "stats_by_country.txt",
            &paths(dir.path()),
            Some("Cumulative numbers."),
            at(),
        )
        .unwrap();

        assert_eq!(path, dir.path().join("Output/reports/stats_by_country.txt"));
        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("Stats by Country\nGenerated on: 2024-05-06 07:08\n\nCumulative numbers.\n"));
        assert!(content.contains("| Italy   |"));
        assert!(content.contains("Total Confirmed Cases:  1,205,730\n"));
        assert!(content.contains("Total Deaths:           20,112\n"));
        assert!(content.contains("1. Italy        - 1,200,000\n"));
        assert!(content.contains("2. Brazil       - 5,000\n"));
        assert!(content.contains("3. Canada       - 700\n"));
        assert!(!content.contains("4. "));
    }

    #[test]
    fn test_dated_tables_have_no_summary() {
        let mut table = Table::new(
            "Yearly",
            ["country", "year", "confirmed_cases", "deaths_cases", "recovered_cases"],
        );
        table.push(vec!["Italy".into(), 2021i32.into(), 1i64.into(), 1i64.into(), 1i64.into()]);

        let report = render_report(&table, None, at());
        assert!(!report.contains("Total Confirmed"));
        assert!(report.starts_with("Yearly\nGenerated on: 2024-05-06 07:08\n\n| country |"));
    }

    #[test]
    fn test_display_path() {
        let base = Path::new("/data");
        assert_eq!(
            display_path(Path::new("/data/Graphics/a.svg"), base),
            "Graphics/a.svg"
        );
        assert_eq!(display_path(Path::new("/elsewhere/a"), base), "/elsewhere/a");
    }
}
