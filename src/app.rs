//! Main application logic and TUI event loop.

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Terminal,
};

use crate::analysis::{StatKind, Table};
use crate::config::Settings;
use crate::data::Filter;
use crate::export::display_path;
use crate::plot::PlotKind;
use crate::session::{self, Session, Status};
use crate::ui::{
    chart::{ChartPreview, OptionSelector},
    widgets::{DataTable, DateInputs, FilterForm, InfoPanel, PageList, StatusBar},
    Dialog, HelpOverlay, Theme,
};

/// Rows moved by PageUp / PageDown
const PAGE_SCROLL: usize = 10;

/// Longest text accepted in a date field
const DATE_LEN: usize = 10;

/// Dashboard page shown in the content area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Data,
    Filter,
    Statistics,
    Visualization,
}

impl Page {
    const ALL: [Page; 4] = [Page::Data, Page::Filter, Page::Statistics, Page::Visualization];
    const TITLES: [&'static str; 4] = ["Data", "Filter", "Statistics", "Visualization"];

    fn index(self) -> usize {
        Page::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Page::ALL[(self.index() + 1) % Page::ALL.len()]
    }

    fn prev(self) -> Self {
        Page::ALL[(self.index() + Page::ALL.len() - 1) % Page::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateField {
    Start,
    End,
}

/// Cycling choices of the filter form; index 0 is "any"
#[derive(Debug, Clone)]
struct FilterChoices {
    options: [Vec<String>; 3],
    selected: [usize; 3],
}

impl FilterChoices {
    const YEAR: usize = 0;
    const MONTH: usize = 1;
    const COUNTRY: usize = 2;

    fn new(settings: &Settings) -> Self {
        let with_any = |values: Vec<String>| {
            std::iter::once(String::new()).chain(values).collect::<Vec<_>>()
        };
        FilterChoices {
            options: [
                with_any(settings.ingest.years().iter().map(i32::to_string).collect()),
                with_any((1..=12).map(|m: u32| m.to_string()).collect()),
                with_any(settings.ingest.countries.clone()),
            ],
            selected: [0; 3],
        }
    }

    fn cycle(&mut self, field: usize) {
        self.selected[field] = (self.selected[field] + 1) % self.options[field].len();
    }

    fn value(&self, field: usize) -> &str {
        &self.options[field][self.selected[field]]
    }

    fn reset(&mut self) {
        self.selected = [0; 3];
    }

    fn filter(&self) -> crate::error::Result<Filter> {
        Filter::parse(
            self.value(Self::YEAR),
            self.value(Self::MONTH),
            self.value(Self::COUNTRY),
        )
    }
}

/// Application state
pub struct App {
    session: Session,
    theme: Theme,

    // UI state
    page: Page,
    view: Option<Table>,
    scroll: usize,
    choices: FilterChoices,
    stat: usize,
    start_date: String,
    end_date: String,
    editing: Option<DateField>,
    plot: usize,
    show_help: bool,
    confirm_clear: bool,

    status: Option<Status>,
    error_message: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let theme = Theme::with_palette(&settings.interface.color_palette);
        let choices = FilterChoices::new(&settings);
        App {
            session: Session::new(settings),
            theme,
            page: Page::Data,
            view: None,
            scroll: 0,
            choices,
            stat: 0,
            start_date: String::new(),
            end_date: String::new(),
            editing: None,
            plot: 0,
            show_help: false,
            confirm_clear: false,
            status: Some(Status::info(
                "Press c to connect, o to load CSV reports, ? for help.",
            )),
            error_message: None,
            should_quit: false,
        }
    }

    /// Run a session action and show its outcome
    fn act(&mut self, action: impl FnOnce(&mut Session) -> crate::error::Result<Status>) {
        match action(&mut self.session) {
            Ok(status) => self.status = Some(status),
            Err(e) => self.set_error(e.to_string()),
        }
        self.refresh_view();
    }

    /// Show an error in the status line and a dialog
    pub fn set_error(&mut self, message: String) {
        log::error!("{message}");
        self.status = Some(Status::error(message.clone()));
        self.error_message = Some(message);
    }

    /// Rebuild the table shown on the current page
    fn refresh_view(&mut self) {
        self.view = match self.page {
            Page::Data => match (self.session.cleaned(), self.session.raw()) {
                (Some(rows), _) => Some(session::observation_table("Cleaned data", rows)),
                (None, Some(rows)) => Some(session::raw_table(rows)),
                (None, None) => None,
            },
            Page::Filter => self.session.analysis_rows().map(|rows| {
                let title = if self.session.filter().is_empty() {
                    "Loaded data"
                } else {
                    "Filtered data"
                };
                session::observation_table(title, rows)
            }),
            Page::Statistics => self.session.last_stat().map(|s| s.table.clone()),
            Page::Visualization => None,
        };
    }

    fn set_page(&mut self, page: Page) {
        self.page = page;
        self.scroll = 0;
        self.editing = None;
        self.refresh_view();
    }

    fn scroll_by(&mut self, delta: isize) {
        let len = self.view.as_ref().map_or(0, Table::len);
        self.scroll = self
            .scroll
            .saturating_add_signed(delta)
            .min(len.saturating_sub(1));
    }

    /// Handle keyboard input
    fn handle_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> Result<()> {
        // Modal states take every key
        if self.error_message.is_some() {
            if matches!(key, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.error_message = None;
            }
            return Ok(());
        }
        if self.confirm_clear {
            match key {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirm_clear = false;
                    self.act(Session::clear_table);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm_clear = false;
                    self.status = Some(Status::info("Clear cancelled."));
                }
                _ => {}
            }
            return Ok(());
        }
        if let Some(field) = self.editing {
            self.handle_date_input(field, key);
            return Ok(());
        }

        // Global shortcuts
        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return Ok(());
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return Ok(());
            }
            KeyCode::Tab => {
                self.set_page(self.page.next());
                return Ok(());
            }
            KeyCode::BackTab => {
                self.set_page(self.page.prev());
                return Ok(());
            }
            _ => {}
        }

        if self.show_help {
            return Ok(());
        }

        match key {
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::PageDown => self.scroll_by(PAGE_SCROLL as isize),
            KeyCode::PageUp => self.scroll_by(-(PAGE_SCROLL as isize)),
            KeyCode::Home => self.scroll = 0,
            KeyCode::Char('L') if self.page != Page::Data => self.act(Session::load_from_db),
            _ => match self.page {
                Page::Data => self.handle_data_keys(key),
                Page::Filter => self.handle_filter_keys(key),
                Page::Statistics => self.handle_statistics_keys(key),
                Page::Visualization => self.handle_visualization_keys(key),
            },
        }
        Ok(())
    }

    fn handle_data_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('c') => self.act(Session::connect),
            KeyCode::Char('o') => self.act(Session::load_csv),
            KeyCode::Char('x') => self.act(Session::clean),
            KeyCode::Char('i') => self.act(Session::insert),
            KeyCode::Char('D') => self.confirm_clear = true,
            _ => {}
        }
    }

    fn handle_filter_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') => self.choices.cycle(FilterChoices::YEAR),
            KeyCode::Char('m') => self.choices.cycle(FilterChoices::MONTH),
            KeyCode::Char('n') => self.choices.cycle(FilterChoices::COUNTRY),
            KeyCode::Enter => match self.choices.filter() {
                Ok(filter) => {
                    self.scroll = 0;
                    self.act(move |s| s.apply_filter(filter));
                }
                Err(e) => self.set_error(e.to_string()),
            },
            KeyCode::Char('u') => {
                self.choices.reset();
                self.scroll = 0;
                self.status = Some(self.session.clear_filter());
                self.refresh_view();
            }
            _ => {}
        }
    }

    fn handle_statistics_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let n = c.to_digit(10).unwrap_or(0) as usize;
                if (1..=StatKind::ALL.len()).contains(&n) {
                    self.stat = n - 1;
                }
            }
            KeyCode::Char('s') => self.editing = Some(DateField::Start),
            KeyCode::Char('t') => self.editing = Some(DateField::End),
            KeyCode::Char('g') => {
                let kind = StatKind::ALL[self.stat];
                let (start, end) = (self.start_date.clone(), self.end_date.clone());
                self.scroll = 0;
                self.act(move |s| s.generate_stat(kind, &start, &end));
            }
            KeyCode::Char('e') => self.act(|s| s.export_stat()),
            KeyCode::Char('p') => self.act(|s| s.save_report()),
            _ => {}
        }
    }

    fn handle_visualization_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let n = c.to_digit(10).unwrap_or(0) as usize;
                if (1..=PlotKind::ALL.len()).contains(&n) {
                    self.plot = n - 1;
                }
            }
            KeyCode::Char('g') => {
                let kind = PlotKind::ALL[self.plot];
                self.act(move |s| s.render_plot(kind));
            }
            _ => {}
        }
    }

    fn handle_date_input(&mut self, field: DateField, key: KeyCode) {
        let text = match field {
            DateField::Start => &mut self.start_date,
            DateField::End => &mut self.end_date,
        };
        match key {
            KeyCode::Char(c) if (c.is_ascii_digit() || c == '-') && text.len() < DATE_LEN => {
                text.push(c);
            }
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Enter | KeyCode::Esc | KeyCode::Tab => self.editing = None,
            _ => {}
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut ratatui::Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Body
                Constraint::Length(2), // Status bar
            ])
            .split(size);

        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(26), // Sidebar
                Constraint::Min(40),    // Content
            ])
            .split(main_chunks[0]);

        let sidebar_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(4)])
            .split(body_chunks[0]);

        PageList::new(&Page::TITLES, self.page.index(), &self.theme).render(frame, sidebar_chunks[0]);
        let entries = self.session_summary();
        InfoPanel::new("Session", &entries, &self.theme).render(frame, sidebar_chunks[1]);

        match self.page {
            Page::Data => self.render_data(frame, body_chunks[1]),
            Page::Filter => self.render_filter(frame, body_chunks[1]),
            Page::Statistics => self.render_statistics(frame, body_chunks[1]),
            Page::Visualization => self.render_visualization(frame, body_chunks[1]),
        }

        StatusBar::new(
            self.status.as_ref(),
            "[Tab] page  [?] help  [q] quit",
            &self.theme,
        )
        .render(frame, main_chunks[1]);

        if self.show_help {
            HelpOverlay::new(&self.theme).render(frame, size);
        }
        if self.confirm_clear {
            Dialog::confirm("Delete every row of the covid_data table?", &self.theme)
                .render(frame, size);
        }
        if let Some(message) = &self.error_message {
            Dialog::error(message, &self.theme).render(frame, size);
        }
    }

    fn session_summary(&self) -> Vec<(&'static str, String)> {
        let count = |n: Option<usize>| n.map_or_else(|| "-".to_string(), |n| n.to_string());
        let settings = self.session.settings();
        vec![
            ("Database", settings.database.db_file().display().to_string()),
            ("CSV rows", count(self.session.raw().map(<[_]>::len))),
            ("Cleaned", count(self.session.cleaned().map(<[_]>::len))),
            ("Loaded", count(self.session.loaded().map(<[_]>::len))),
            ("In view", count(self.session.analysis_rows().map(<[_]>::len))),
            ("Filter", self.session.filter().to_string()),
        ]
    }

    fn hint_line(&self, text: &str) -> Paragraph<'static> {
        Paragraph::new(Line::from(Span::styled(text.to_string(), self.theme.dimmed_style())))
    }

    fn render_data(&self, frame: &mut ratatui::Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(area);

        frame.render_widget(
            self.hint_line("[c] connect  [o] load CSVs  [x] clean  [i] insert  [D] clear table"),
            chunks[0],
        );
        DataTable::new(
            self.view.as_ref(),
            self.scroll,
            "No data yet. Press o to load the CSV reports.",
            &self.theme,
        )
        .render(frame, chunks[1]);
    }

    fn render_filter(&self, frame: &mut ratatui::Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(3)])
            .split(area);

        let active = self.session.filter().to_string();
        FilterForm::new(
            [
                ("y", "Year", self.choices.value(FilterChoices::YEAR)),
                ("m", "Month", self.choices.value(FilterChoices::MONTH)),
                ("n", "Country", self.choices.value(FilterChoices::COUNTRY)),
            ],
            &active,
            &self.theme,
        )
        .render(frame, chunks[0]);

        DataTable::new(
            self.view.as_ref(),
            self.scroll,
            "No data loaded. Press L to load rows from the database.",
            &self.theme,
        )
        .render(frame, chunks[1]);
    }

    fn render_statistics(&self, frame: &mut ratatui::Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(3),
            ])
            .split(area);

        let labels: Vec<&str> = StatKind::ALL.iter().map(|k| k.label()).collect();
        OptionSelector::new(&labels, self.stat, &self.theme).render(frame, chunks[0]);

        let editing = self.editing.map(|f| match f {
            DateField::Start => 0,
            DateField::End => 1,
        });
        DateInputs::new(&self.start_date, &self.end_date, editing, &self.theme).render(frame, chunks[1]);
        frame.render_widget(
            self.hint_line("[g] generate  [e] export CSV  [p] save report  [L] load"),
            chunks[2],
        );

        DataTable::new(
            self.view.as_ref(),
            self.scroll,
            "Choose a statistic with 1-8 and press g to generate it.",
            &self.theme,
        )
        .render(frame, chunks[3]);
    }

    fn render_visualization(&self, frame: &mut ratatui::Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(5),
            ])
            .split(area);

        let labels: Vec<&str> = PlotKind::ALL.iter().map(|k| k.label()).collect();
        OptionSelector::new(&labels, self.plot, &self.theme).render(frame, chunks[0]);
        frame.render_widget(self.hint_line("[g] render SVG  [L] load"), chunks[1]);

        let kind = PlotKind::ALL[self.plot];
        let saved_to = self
            .session
            .last_plot()
            .filter(|(k, _)| *k == kind)
            .map(|(_, path)| display_path(path, &self.session.settings().paths.base_dir));
        ChartPreview::new(kind, self.session.totals(), saved_to, &self.theme).render(frame, chunks[2]);
    }
}

/// Restore terminal to normal state
fn restore_terminal() {
    // Best effort: this also runs while unwinding from an error
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Run the TUI application
pub fn run(settings: Settings) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        restore_terminal();
        return Err(e).context("Failed to setup terminal");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to create terminal");
        }
    };

    let mut app = App::new(settings);
    let result = run_main_loop(&mut terminal, &mut app);

    // Always restore terminal, regardless of result
    restore_terminal();
    terminal.show_cursor().ok();

    result
}

/// Main application loop
fn run_main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Err(e) = app.handle_input(key.code, key.modifiers) {
                    app.set_error(format!("Input error: {e}"));
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
