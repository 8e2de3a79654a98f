//! UI widgets for the COVID-19 dashboard.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame,
};

use super::theme::Theme;
use crate::analysis;
use crate::session::Status;

/// Widest a table column is allowed to grow, in characters
const MAX_COLUMN_WIDTH: usize = 24;

fn panel_block<'a>(title: String, focused: bool, theme: &Theme) -> Block<'a> {
    let (border_style, title_style) = theme.panel_styles(focused);
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(if focused {
            BorderType::Double
        } else {
            BorderType::Plain
        })
        .border_style(border_style)
        .title_style(title_style)
}

/// Sidebar list of dashboard pages
pub struct PageList<'a> {
    pages: &'a [&'a str],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> PageList<'a> {
    pub fn new(pages: &'a [&'a str], selected: usize, theme: &'a Theme) -> Self {
        PageList {
            pages,
            selected,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .pages
            .iter()
            .map(|p| ListItem::new(*p))
            .collect();

        let list = List::new(items)
            .block(panel_block(" Pages ".to_string(), true, self.theme))
            .highlight_style(self.theme.highlight_style())
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

/// Key/value panel summarizing the session
pub struct InfoPanel<'a> {
    title: &'a str,
    entries: &'a [(&'a str, String)],
    theme: &'a Theme,
}

impl<'a> InfoPanel<'a> {
    pub fn new(title: &'a str, entries: &'a [(&'a str, String)], theme: &'a Theme) -> Self {
        InfoPanel {
            title,
            entries,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .entries
            .iter()
            .map(|(key, value)| {
                Line::from(vec![
                    Span::styled(format!("{key}: "), self.theme.dimmed_style()),
                    Span::styled(value.clone(), self.theme.normal_style()),
                ])
            })
            .collect();

        let paragraph = Paragraph::new(lines)
            .block(panel_block(format!(" {} ", self.title), false, self.theme))
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, area);
    }
}

/// Scrollable view of a result table
pub struct DataTable<'a> {
    table: Option<&'a analysis::Table>,
    scroll: usize,
    empty_message: &'a str,
    theme: &'a Theme,
}

impl<'a> DataTable<'a> {
    pub fn new(
        table: Option<&'a analysis::Table>,
        scroll: usize,
        empty_message: &'a str,
        theme: &'a Theme,
    ) -> Self {
        DataTable {
            table,
            scroll,
            empty_message,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(table) = self.table.filter(|t| !t.columns.is_empty()) else {
            let paragraph = Paragraph::new(self.empty_message)
                .style(self.theme.dimmed_style())
                .block(panel_block(" Table ".to_string(), false, self.theme))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        };

        // Borders and header take three rows
        let visible = area.height.saturating_sub(3) as usize;
        let start = clamp_scroll(self.scroll, table.len(), visible);
        let window = &table.rows[start..(start + visible).min(table.len())];

        let cells: Vec<Vec<String>> = window
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        let widths = column_widths(&table.columns, &cells);

        let header = Row::new(table.columns.iter().map(String::as_str))
            .style(self.theme.title_style().add_modifier(Modifier::UNDERLINED));
        let rows = cells.into_iter().map(Row::new);

        let title = if table.is_empty() {
            format!(" {} (no rows) ", table.title)
        } else {
            format!(
                " {} ({}-{} of {}) ",
                table.title,
                start + 1,
                start + window.len(),
                table.len()
            )
        };

        let widget = Table::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .style(self.theme.normal_style())
            .block(panel_block(title, true, self.theme));
        frame.render_widget(widget, area);
    }
}

/// First row to show so that the last page is always full
pub fn clamp_scroll(scroll: usize, len: usize, visible: usize) -> usize {
    scroll.min(len.saturating_sub(visible))
}

fn column_widths(columns: &[String], cells: &[Vec<String>]) -> Vec<Constraint> {
    columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let width = cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH);
            Constraint::Length(width as u16)
        })
        .collect()
}

/// Year / month / country selection of the filter page
pub struct FilterForm<'a> {
    fields: [(&'a str, &'a str, &'a str); 3],
    active: &'a str,
    theme: &'a Theme,
}

impl<'a> FilterForm<'a> {
    /// `fields` holds (key, label, current value); blank values mean "any"
    pub fn new(fields: [(&'a str, &'a str, &'a str); 3], active: &'a str, theme: &'a Theme) -> Self {
        FilterForm {
            fields,
            active,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for (key, label, value) in self.fields {
            spans.push(Span::styled(format!("[{key}] "), self.theme.dimmed_style()));
            spans.push(Span::styled(format!("{label}: "), self.theme.title_style()));
            let value = if value.is_empty() { "any" } else { value };
            spans.push(Span::styled(format!("{value:<16}"), self.theme.highlight_style()));
            spans.push(Span::raw("  "));
        }

        let lines = vec![
            Line::from(spans),
            Line::from(vec![
                Span::styled("Active: ", self.theme.dimmed_style()),
                Span::raw(self.active.to_string()),
                Span::styled("   [Enter] apply  [u] reset  [L] load", self.theme.dimmed_style()),
            ]),
        ];

        let paragraph =
            Paragraph::new(lines).block(panel_block(" Filter ".to_string(), false, self.theme));
        frame.render_widget(paragraph, area);
    }
}

/// Start / end date inputs of the date range statistic
pub struct DateInputs<'a> {
    start: &'a str,
    end: &'a str,
    /// 0 for start, 1 for end, `None` when not editing
    editing: Option<usize>,
    theme: &'a Theme,
}

impl<'a> DateInputs<'a> {
    pub fn new(start: &'a str, end: &'a str, editing: Option<usize>, theme: &'a Theme) -> Self {
        DateInputs {
            start,
            end,
            editing,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let field = |idx: usize, key: &str, label: &str, value: &str| {
            let editing = self.editing == Some(idx);
            let style = if editing {
                self.theme.focused_border_style()
            } else {
                self.theme.highlight_style()
            };
            let cursor = if editing { "_" } else { "" };
            vec![
                Span::styled(format!("[{key}] "), self.theme.dimmed_style()),
                Span::styled(format!("{label}: "), self.theme.title_style()),
                Span::styled(format!("{value}{cursor:<11}"), style),
                Span::raw("  "),
            ]
        };

        let mut spans = field(0, "s", "Start", self.start);
        spans.extend(field(1, "t", "End", self.end));
        spans.push(Span::styled("YYYY-MM-DD", self.theme.dimmed_style()));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    status: Option<&'a Status>,
    hints: &'a str,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(status: Option<&'a Status>, hints: &'a str, theme: &'a Theme) -> Self {
        StatusBar {
            status,
            hints,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        if let Some(status) = self.status {
            spans.push(Span::styled(
                status.message.clone(),
                self.theme.severity_style(status.severity),
            ));
            spans.push(Span::raw(" | "));
        }
        spans.push(Span::styled(self.hints.to_string(), self.theme.dimmed_style()));

        let paragraph = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::TOP).border_style(self.theme.border_style()))
            .style(Style::default());

        frame.render_widget(paragraph, area);
    }
}
