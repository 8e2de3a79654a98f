//! Help overlay and modal dialogs.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::theme::Theme;

/// Help overlay showing all keyboard shortcuts
pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        HelpOverlay { theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(70, 85, area);
        frame.render_widget(Clear, popup_area);

        const DESCRIPTION: &str = "Load COVID-19 daily reports from CSV, clean them, store them in SQLite, then filter, summarize, export and chart the data.";

        let shortcuts = [
            ("General", vec![
                ("Tab / Shift+Tab", "Next / previous page"),
                ("L", "Load rows from the database"),
                ("j / ↓, k / ↑", "Scroll the table"),
                ("PgDn / PgUp", "Scroll a page"),
                ("h / ?", "Toggle this help"),
                ("Esc", "Close dialog"),
                ("q", "Quit"),
            ]),
            ("Data", vec![
                ("c", "Connect to the database"),
                ("o", "Load CSV reports"),
                ("x", "Clean loaded data"),
                ("i", "Insert cleaned data"),
                ("D", "Clear the table (asks first)"),
            ]),
            ("Filter", vec![
                ("y / m / n", "Cycle year / month / country"),
                ("Enter", "Apply filter"),
                ("u", "Reset filter"),
            ]),
            ("Statistics", vec![
                ("1-8", "Choose a statistic"),
                ("s / t", "Edit start / end date"),
                ("g", "Generate"),
                ("e", "Export CSV"),
                ("p", "Save report"),
            ]),
            ("Visualization", vec![
                ("1-5", "Choose a chart"),
                ("g", "Render SVG"),
            ]),
        ];

        let mut lines: Vec<Line> = Vec::new();

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {DESCRIPTION}"),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::from(""));

        for (section, items) in shortcuts {
            lines.push(Line::from(Span::styled(
                format!("  {section} "),
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::UNDERLINED),
            )));

            for (key, desc) in items {
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(format!("{key:<18}"), Style::default().fg(self.theme.title)),
                    Span::raw(desc),
                ]));
            }
            lines.push(Line::from(""));
        }

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" covid-tui Help ")
                    .title_alignment(Alignment::Center)
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style())
                    .title_style(self.theme.title_style())
                    .style(self.theme.surface_style()),
            )
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false })
            .style(self.theme.surface_style());

        frame.render_widget(paragraph, popup_area);
    }
}

/// Small centered message box: errors and confirmations
pub struct Dialog<'a> {
    title: &'a str,
    message: &'a str,
    footer: &'a str,
    style: Style,
    theme: &'a Theme,
}

impl<'a> Dialog<'a> {
    pub fn error(message: &'a str, theme: &'a Theme) -> Self {
        Dialog {
            title: " Error ",
            message,
            footer: "[Esc] close",
            style: Style::default().fg(theme.status_error),
            theme,
        }
    }

    pub fn confirm(message: &'a str, theme: &'a Theme) -> Self {
        Dialog {
            title: " Confirm ",
            message,
            footer: "[y] yes  [n / Esc] no",
            style: Style::default().fg(theme.status_warning),
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let lines = vec![
            Line::from(""),
            Line::from(self.message),
            Line::from(""),
            Line::from(Span::styled(self.footer, self.theme.dimmed_style())),
        ];

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(self.title)
                    .title_alignment(Alignment::Center)
                    .borders(Borders::ALL)
                    .border_style(self.style)
                    .title_style(self.style.add_modifier(Modifier::BOLD))
                    .style(self.theme.surface_style()),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, popup_area);
    }
}

/// Create a centered rect for popup dialogs
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
