//! Chart previews and the numbered option selector.

use ratatui::{
    layout::{Alignment, Direction, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::theme::Theme;
use crate::analysis::metrics::Summary;
use crate::data::DailyTotal;
use crate::plot::{compact, series, PlotKind};

/// Terminal rendition of a chart, drawn from the same series as the SVG files
pub struct ChartPreview<'a> {
    kind: PlotKind,
    totals: &'a [DailyTotal],
    saved_to: Option<String>,
    theme: &'a Theme,
}

impl<'a> ChartPreview<'a> {
    pub fn new(kind: PlotKind, totals: &'a [DailyTotal], saved_to: Option<String>, theme: &'a Theme) -> Self {
        ChartPreview {
            kind,
            totals,
            saved_to,
            theme,
        }
    }

    fn block(&self) -> Block<'a> {
        let title = match &self.saved_to {
            Some(path) => format!(" {} (saved to {path}) ", self.kind.label()),
            None => format!(" {} ", self.kind.label()),
        };
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title_style(self.theme.title_style())
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if self.totals.is_empty() {
            self.render_empty(frame, area);
            return;
        }

        match self.kind {
            PlotKind::Heatmap => self.render_heatmap(frame, area),
            PlotKind::Bar => self.render_bars(frame, area),
            PlotKind::Line => self.render_trend(frame, area),
            PlotKind::Boxplot => self.render_distribution(frame, area),
            PlotKind::Scatter => self.render_scatter(frame, area),
        }
    }

    fn render_heatmap(&self, frame: &mut Frame, area: Rect) {
        let matrix = series::correlation_matrix(self.totals);

        let mut header = vec![Span::raw(format!("{:<12}", ""))];
        header.extend(
            series::COUNT_LABELS
                .iter()
                .map(|l| Span::styled(format!("{l:>12}"), self.theme.title_style())),
        );
        let mut lines = vec![Line::from(""), Line::from(header)];

        for (label, row) in series::COUNT_LABELS.iter().zip(matrix) {
            let mut spans = vec![Span::styled(format!("{label:<12}"), self.theme.title_style())];
            for r in row {
                let text = r.map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}"));
                spans.push(Span::styled(format!("{text:>12}"), correlation_style(r)));
            }
            lines.push(Line::from(spans));
        }

        frame.render_widget(Paragraph::new(lines).block(self.block()), area);
    }

    fn render_bars(&self, frame: &mut Frame, area: Rect) {
        let ranked = series::country_totals(self.totals);
        let bars: Vec<Bar> = ranked
            .iter()
            .enumerate()
            .map(|(i, (country, confirmed))| {
                Bar::default()
                    .value((*confirmed).max(0) as u64)
                    .label(Line::from(country.as_str()))
                    .text_value(compact(*confirmed as f64))
                    .style(Style::default().fg(self.theme.chart_color(i)))
            })
            .collect();

        let chart = BarChart::default()
            .block(self.block())
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(1)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn render_trend(&self, frame: &mut Frame, area: Rect) {
        let trend = series::monthly_trend(self.totals);
        let points: Vec<Vec<(f64, f64)>> = trend
            .series
            .iter()
            .map(|(_, p)| p.iter().map(|&(i, v)| (i as f64, v as f64)).collect())
            .collect();

        let datasets: Vec<Dataset> = trend
            .series
            .iter()
            .zip(&points)
            .enumerate()
            .map(|(i, ((country, _), data))| {
                Dataset::default()
                    .name(country.clone())
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(self.theme.chart_color(i)))
                    .data(data)
            })
            .collect();

        let x_max = (trend.months.len().saturating_sub(1)).max(1) as f64;
        let y_max = trend.max_value().max(1) as f64 * 1.05;
        let month = |i: usize| trend.months.get(i).cloned().unwrap_or_default();
        let x_labels = vec![
            Span::raw(month(0)),
            Span::raw(month(trend.months.len() / 2)),
            Span::raw(month(trend.months.len().saturating_sub(1))),
        ];

        let chart = Chart::new(datasets)
            .block(self.block())
            .x_axis(
                Axis::default()
                    .title(Span::styled("month", Style::default().add_modifier(Modifier::DIM)))
                    .style(self.theme.normal_style())
                    .bounds([0.0, x_max])
                    .labels(x_labels),
            )
            .y_axis(value_axis(y_max, self.theme));
        frame.render_widget(chart, area);
    }

    fn render_distribution(&self, frame: &mut Frame, area: Rect) {
        let groups = series::month_distribution(self.totals);

        let header = format!(
            "{:>5} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "month", "days", "min", "25%", "median", "75%", "max"
        );
        let mut lines = vec![Line::from(""), Line::styled(header, self.theme.title_style())];

        let cell = |v: Option<f64>| v.map(compact).unwrap_or_default();
        for (month, values) in groups {
            let values: Vec<f64> = values.into_iter().map(|v| v as f64).collect();
            let s = Summary::of(&values);
            lines.push(Line::from(format!(
                "{month:>5} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10}",
                s.count,
                cell(s.min),
                cell(s.q25),
                cell(s.median),
                cell(s.q75),
                cell(s.max)
            )));
        }

        frame.render_widget(Paragraph::new(lines).block(self.block()), area);
    }

    fn render_scatter(&self, frame: &mut Frame, area: Rect) {
        let points: Vec<(String, [(f64, f64); 1])> = series::deaths_vs_cases(self.totals)
            .into_iter()
            .map(|(country, confirmed, deaths)| (country, [(confirmed as f64, deaths as f64)]))
            .collect();

        let x_max = points.iter().map(|p| p.1[0].0).fold(1.0, f64::max) * 1.1;
        let y_max = points.iter().map(|p| p.1[0].1).fold(1.0, f64::max) * 1.1;

        let datasets: Vec<Dataset> = points
            .iter()
            .enumerate()
            .map(|(i, (country, point))| {
                Dataset::default()
                    .name(country.clone())
                    .marker(Marker::Block)
                    .graph_type(GraphType::Scatter)
                    .style(Style::default().fg(self.theme.chart_color(i)))
                    .data(point)
            })
            .collect();

        let chart = Chart::new(datasets)
            .block(self.block())
            .x_axis(
                Axis::default()
                    .title(Span::styled("confirmed", Style::default().add_modifier(Modifier::DIM)))
                    .style(self.theme.normal_style())
                    .bounds([0.0, x_max])
                    .labels(vec![Span::raw("0"), Span::raw(compact(x_max / 2.0)), Span::raw(compact(x_max))]),
            )
            .y_axis(value_axis(y_max, self.theme));
        frame.render_widget(chart, area);
    }

    fn render_empty(&self, frame: &mut Frame, area: Rect) {
        let block = self.block();
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let message = Paragraph::new("No data loaded. Press L to load rows from the database.")
            .style(Style::default().add_modifier(Modifier::DIM))
            .alignment(Alignment::Center);
        frame.render_widget(message, inner);
    }
}

fn value_axis<'a>(max: f64, theme: &Theme) -> Axis<'a> {
    Axis::default()
        .style(theme.normal_style())
        .bounds([0.0, max])
        .labels(vec![
            Span::raw("0"),
            Span::raw(compact(max / 2.0)),
            Span::raw(compact(max)),
        ])
}

fn correlation_style(r: Option<f64>) -> Style {
    match r {
        Some(r) if r >= 0.5 => Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
        Some(r) if r <= -0.5 => Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD),
        Some(_) => Style::default(),
        None => Style::default().add_modifier(Modifier::DIM),
    }
}

/// Numbered options, e.g. `[1] Country Stats  [2] Rates`
pub struct OptionSelector<'a> {
    options: &'a [&'a str],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> OptionSelector<'a> {
    pub fn new(options: &'a [&'a str], selected: usize, theme: &'a Theme) -> Self {
        OptionSelector {
            options,
            selected,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let spans: Vec<Span> = self
            .options
            .iter()
            .enumerate()
            .flat_map(|(i, name)| {
                let style = if i == self.selected {
                    self.theme.highlight_style()
                } else {
                    self.theme.normal_style()
                };
                [
                    Span::styled(format!("[{}] ", i + 1), Style::default().add_modifier(Modifier::DIM)),
                    Span::styled(format!("{name}  "), style),
                ]
            })
            .collect();

        let paragraph = Paragraph::new(Line::from(spans)).style(self.theme.normal_style());
        frame.render_widget(paragraph, area);
    }
}
