//! Charts of the daily totals, written as SVG files under `Graphics/`.

mod render;
pub mod series;

use std::fs;
use std::path::PathBuf;

pub use render::{compact, palette};

use crate::config::Settings;
use crate::data::DailyTotal;
use crate::error::{CovidError, Result};

/// Charts offered by the dashboard and the `plot` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PlotKind {
    Heatmap,
    Bar,
    Line,
    Boxplot,
    Scatter,
}

impl PlotKind {
    pub const ALL: [PlotKind; 5] = [
        PlotKind::Heatmap,
        PlotKind::Bar,
        PlotKind::Line,
        PlotKind::Boxplot,
        PlotKind::Scatter,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PlotKind::Heatmap => "Correlation Heatmap",
            PlotKind::Bar => "Total Cases by Country",
            PlotKind::Line => "Line Trend by Country",
            PlotKind::Boxplot => "Boxplot by Month",
            PlotKind::Scatter => "Deaths vs Cases",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            PlotKind::Heatmap => "correlation_heatmap.svg",
            PlotKind::Bar => "bar_total_cases.svg",
            PlotKind::Line => "line_trend_by_country.svg",
            PlotKind::Boxplot => "boxplot_cases_by_month.svg",
            PlotKind::Scatter => "scatter_deaths_vs_cases.svg",
        }
    }
}

/// Render a chart into the graphics folder and return its path
pub fn render(kind: PlotKind, totals: &[DailyTotal], settings: &Settings) -> Result<PathBuf> {
    if totals.is_empty() {
        return Err(CovidError::NoData);
    }

    let dir = settings.paths.graphics_dir();
    fs::create_dir_all(&dir)?;
    let path = dir.join(kind.file_name());
    let colors = palette(&settings.interface.color_palette);

    let drawn = match kind {
        PlotKind::Heatmap => {
            render::correlation_heatmap(&path, &series::correlation_matrix(totals))
        }
        PlotKind::Bar => render::bar_total_cases(&path, &series::country_totals(totals), colors[0]),
        PlotKind::Line => {
            render::line_trend_by_country(&path, &series::monthly_trend(totals), &colors)
        }
        PlotKind::Boxplot => {
            render::boxplot_cases_by_month(&path, &series::month_distribution(totals), colors[0])
        }
        PlotKind::Scatter => {
            render::scatter_deaths_vs_cases(&path, &series::deaths_vs_cases(totals), &colors)
        }
    };
    drawn.map_err(|e| {
        log::error!("{} failed: {e}", kind.label());
        CovidError::Plot(e.to_string())
    })?;

    log::info!("{} saved to {}", kind.label(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn totals() -> Vec<DailyTotal> {
        let mut out = Vec::new();
        for (country, scale) in [("Italy", 3), ("Egypt", 1), ("Brazil", 2)] {
            for (i, month) in [1u32, 2, 5, 11].into_iter().enumerate() {
                let confirmed = scale * 1_000 * (i as i64 + 1);
                out.push(DailyTotal {
                    country: country.to_string(),
                    date: NaiveDate::from_ymd_opt(2021, month, 1).unwrap(),
                    confirmed,
                    deaths: confirmed / 50,
                    recovered: confirmed / 2 + i as i64,
                    latitude: 0.0,
                    longitude: 0.0,
                });
            }
        }
        out
    }

    #[test]
    fn test_every_chart_writes_an_svg() {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.paths.base_dir = dir.path().to_path_buf();

        for kind in PlotKind::ALL {
            let path = render(kind, &totals(), &settings).unwrap();
            assert_eq!(path, dir.path().join("Graphics").join(kind.file_name()));
            let svg = fs::read_to_string(&path).unwrap();
            assert!(svg.contains("<svg"), "{} is not an SVG", kind.label());
        }
    }

    #[test]
    fn test_render_without_data() {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.paths.base_dir = dir.path().to_path_buf();

        assert!(matches!(
            render(PlotKind::Bar, &[], &settings),
            Err(CovidError::NoData)
        ));
        assert!(!dir.path().join("Graphics").exists());
    }

    #[test]
    fn test_single_country_single_month() {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.paths.base_dir = dir.path().to_path_buf();
        let one = &totals()[..1];

        for kind in PlotKind::ALL {
            assert!(render(kind, one, &settings).is_ok(), "{} failed", kind.label());
        }
    }
}
