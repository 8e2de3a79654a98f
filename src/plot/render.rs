//! SVG rendering of the charts with plotters.

use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use super::series::{Trend, COUNT_LABELS};

pub(super) type DrawResult = Result<(), Box<dyn Error>>;

const CAPTION_FONT: (&str, u32) = ("sans-serif", 22);

/// Series colours used when the configuration sets none
const DEFAULT_PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(23, 190, 207),
];

/// Parse configured `#RRGGBB` colours, falling back to the built-in palette
pub fn palette(colors: &[String]) -> Vec<RGBColor> {
    let parsed: Vec<RGBColor> = colors
        .iter()
        .filter_map(|c| crate::config::parse_hex_color(c))
        .map(|(r, g, b)| RGBColor(r, g, b))
        .collect();
    if parsed.is_empty() {
        DEFAULT_PALETTE.to_vec()
    } else {
        parsed
    }
}

/// Axis label for large counts: `1.2M`, `350K`
pub fn compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.0}K", value / 1_000.0)
    } else {
        format!("{value:.0}")
    }
}

fn segment_label(value: &SegmentValue<i32>, labels: &[&str]) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels
            .get(*i as usize)
            .map(|l| l.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Diverging blue / grey / red scale over [-1, 1]
fn coolwarm(r: f64) -> RGBColor {
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let r = r.clamp(-1.0, 1.0);
    let (to, k) = if r < 0.0 { (COLD, -r) } else { (WARM, r) };
    let mix = |a: f64, b: f64| (a + (b - a) * k).round() as u8;
    RGBColor(mix(MID.0, to.0), mix(MID.1, to.1), mix(MID.2, to.2))
}

pub(super) fn correlation_heatmap(path: &Path, matrix: &[[Option<f64>; 3]; 3]) -> DrawResult {
    let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Correlation Heatmap: Confirmed, Deaths, Recovered", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(100)
        .build_cartesian_2d((0i32..2).into_segmented(), (0i32..2).into_segmented())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(3)
        .y_labels(3)
        .x_label_formatter(&|v: &SegmentValue<i32>| segment_label(v, &COUNT_LABELS))
        .y_label_formatter(&|v: &SegmentValue<i32>| segment_label(v, &COUNT_LABELS))
        .draw()?;

    let cells: Vec<(i32, i32, Option<f64>)> = (0..3)
        .flat_map(|x| (0..3).map(move |y| (x as i32, y as i32, matrix[y][x])))
        .collect();

    chart.draw_series(cells.iter().map(|&(x, y, r)| {
        let fill = r.map_or(RGBColor(240, 240, 240), coolwarm);
        Rectangle::new(
            [
                (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
            ],
            fill.filled(),
        )
    }))?;
    chart.draw_series(cells.iter().map(|&(x, y, r)| {
        let label = r.map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}"));
        Text::new(
            label,
            (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
            ("sans-serif", 18).into_font(),
        )
    }))?;

    root.present()?;
    Ok(())
}

pub(super) fn bar_total_cases(path: &Path, ranked: &[(String, i64)], color: RGBColor) -> DrawResult {
    let n = ranked.len() as i32;
    let max = ranked.iter().map(|r| r.1).max().unwrap_or(0).max(1) as f64;
    // Largest bar on top
    let labels: Vec<&str> = ranked.iter().rev().map(|(c, _)| c.as_str()).collect();

    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Total Confirmed Cases by Country", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(140)
        .build_cartesian_2d(0f64..max * 1.05, (0i32..(n - 1).max(1)).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(labels.len())
        .y_label_formatter(&|v: &SegmentValue<i32>| segment_label(v, &labels))
        .x_label_formatter(&|v: &f64| compact(*v))
        .x_desc("Confirmed Cases")
        .y_desc("Country")
        .draw()?;

    chart.draw_series(ranked.iter().rev().enumerate().map(|(i, (_, value))| {
        let i = i as i32;
        let mut bar = Rectangle::new(
            [
                (0.0, SegmentValue::Exact(i)),
                (*value as f64, SegmentValue::Exact(i + 1)),
            ],
            color.filled(),
        );
        bar.set_margin(4, 4, 0, 0);
        bar
    }))?;

    root.present()?;
    Ok(())
}

pub(super) fn line_trend_by_country(path: &Path, trend: &Trend, palette: &[RGBColor]) -> DrawResult {
    let n = trend.months.len() as i32;
    let max = trend.max_value().max(1) as f64;

    let root = SVGBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Confirmed Case Trend by Country", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0i32..(n - 1).max(1), 0f64..max * 1.05)?;

    chart
        .configure_mesh()
        .x_labels(trend.months.len().min(12))
        .x_label_formatter(&|i: &i32| trend.months.get(*i as usize).cloned().unwrap_or_default())
        .y_label_formatter(&|v: &f64| compact(*v))
        .x_desc("Month")
        .y_desc("Confirmed Cases")
        .draw()?;

    for (idx, (country, points)) in trend.series.iter().enumerate() {
        let color = palette[idx % palette.len()];
        chart
            .draw_series(LineSeries::new(
                points.iter().map(|&(i, v)| (i as i32, v as f64)),
                color.stroke_width(2),
            ))?
            .label(country.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

pub(super) fn boxplot_cases_by_month(
    path: &Path,
    groups: &BTreeMap<u32, Vec<i64>>,
    color: RGBColor,
) -> DrawResult {
    let max = groups.values().flatten().copied().max().unwrap_or(0).max(1) as f32;

    let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Distribution of Confirmed Cases by Month", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d((1i32..12).into_segmented(), 0f32..max * 1.05)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(12)
        .x_label_formatter(&|v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(month) => month.to_string(),
            _ => String::new(),
        })
        .y_label_formatter(&|v: &f32| compact(*v as f64))
        .x_desc("Month")
        .y_desc("Confirmed Cases")
        .draw()?;

    chart.draw_series(groups.iter().filter(|(_, v)| !v.is_empty()).map(|(month, values)| {
        let values: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        Boxplot::new_vertical(SegmentValue::CenterOf(*month as i32), &Quartiles::new(&values))
            .width(24)
            .whisker_width(0.5)
            .style(color.stroke_width(2))
    }))?;

    root.present()?;
    Ok(())
}

pub(super) fn scatter_deaths_vs_cases(
    path: &Path,
    points: &[(String, i64, i64)],
    palette: &[RGBColor],
) -> DrawResult {
    let max_x = points.iter().map(|p| p.1).max().unwrap_or(0).max(1) as f64;
    let max_y = points.iter().map(|p| p.2).max().unwrap_or(0).max(1) as f64;

    let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Deaths vs Confirmed Cases by Country", CAPTION_FONT)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..max_x * 1.1, 0f64..max_y * 1.1)?;

    chart
        .configure_mesh()
        .x_label_formatter(&|v: &f64| compact(*v))
        .y_label_formatter(&|v: &f64| compact(*v))
        .x_desc("Confirmed Cases")
        .y_desc("Deaths")
        .draw()?;

    for (idx, (country, confirmed, deaths)) in points.iter().enumerate() {
        let color = palette[idx % palette.len()];
        chart
            .draw_series(std::iter::once(Circle::new(
                (*confirmed as f64, *deaths as f64),
                6,
                color.filled(),
            )))?
            .label(country.as_str())
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact() {
        assert_eq!(compact(950.0), "950");
        assert_eq!(compact(12_400.0), "12K");
        assert_eq!(compact(3_400_000.0), "3.4M");
    }

    #[test]
    fn test_palette_fallback() {
        assert_eq!(palette(&[]).len(), DEFAULT_PALETTE.len());
        assert_eq!(palette(&["nope".to_string()]).len(), DEFAULT_PALETTE.len());
        assert_eq!(
            palette(&["#ff0000".to_string()]),
            vec![RGBColor(255, 0, 0)]
        );
    }

    #[test]
    fn test_coolwarm_ends() {
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        assert_eq!(coolwarm(-1.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(0.0), RGBColor(221, 221, 221));
    }
}
