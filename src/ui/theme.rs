//! Theme configuration for the TUI.

use ratatui::style::{Color, Modifier, Style};

use crate::config::parse_hex_color;
use crate::session::Severity;

/// Color theme for the application
#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub border: Color,
    pub title: Color,
    pub status_info: Color,
    pub status_success: Color,
    pub status_warning: Color,
    pub status_error: Color,
    pub chart_colors: Vec<Color>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            bg: Color::Reset,
            fg: Color::White,
            highlight_bg: Color::Rgb(60, 60, 80),
            highlight_fg: Color::White,
            border: Color::Rgb(100, 100, 120),
            title: Color::Cyan,
            status_info: Color::Blue,
            status_success: Color::Green,
            status_warning: Color::Yellow,
            status_error: Color::Red,
            // Named colors render on terminals without true colour
            chart_colors: vec![
                Color::Red,
                Color::Green,
                Color::Yellow,
                Color::Blue,
                Color::Magenta,
                Color::Cyan,
                Color::LightRed,
                Color::LightGreen,
            ],
        }
    }
}

impl Theme {
    /// Default theme with chart colours taken from `#RRGGBB` strings
    pub fn with_palette(colors: &[String]) -> Self {
        let chart_colors: Vec<Color> = colors
            .iter()
            .filter_map(|c| parse_hex_color(c))
            .map(|(r, g, b)| Color::Rgb(r, g, b))
            .collect();

        let mut theme = Theme::default();
        if !chart_colors.is_empty() {
            theme.chart_colors = chart_colors;
        }
        theme
    }

    /// Base surface style used to paint widget backgrounds
    pub fn surface_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// (border_style, title_style) for a panel's focus state
    pub fn panel_styles(&self, focused: bool) -> (Style, Style) {
        if focused {
            (self.focused_border_style(), self.focused_border_style())
        } else {
            (self.border_style(), self.title_style())
        }
    }

    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Style for highlighted/selected items
    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn focused_border_style(&self) -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.title)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dimmed_style(&self) -> Style {
        Style::default()
            .fg(self.border)
            .add_modifier(Modifier::DIM)
    }

    /// Status line colour for a message severity
    pub fn severity_style(&self, severity: Severity) -> Style {
        let color = match severity {
            Severity::Info => self.status_info,
            Severity::Success => self.status_success,
            Severity::Warning => self.status_warning,
            Severity::Error => self.status_error,
        };
        Style::default().fg(color)
    }

    /// Chart colour by series index, cycling through the palette
    pub fn chart_color(&self, index: usize) -> Color {
        self.chart_colors[index % self.chart_colors.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_colors_are_distinct() {
        let theme = Theme::default();
        let c0 = theme.chart_color(0);
        let c1 = theme.chart_color(1);
        let c2 = theme.chart_color(2);
        assert_ne!(c0, c1, "Colors 0 and 1 should be different");
        assert_ne!(c1, c2, "Colors 1 and 2 should be different");
        assert_ne!(c0, c2, "Colors 0 and 2 should be different");
    }

    #[test]
    fn test_chart_color_cycles() {
        let theme = Theme::default();
        let len = theme.chart_colors.len();
        assert_eq!(theme.chart_color(0), theme.chart_color(len));
        assert_eq!(theme.chart_color(1), theme.chart_color(len + 1));
    }

    #[test]
    fn test_palette_from_config() {
        let theme = Theme::with_palette(&["#102030".to_string(), "#ffffff".to_string()]);
        assert_eq!(theme.chart_colors, vec![Color::Rgb(16, 32, 48), Color::Rgb(255, 255, 255)]);

        let fallback = Theme::with_palette(&[]);
        assert_eq!(fallback.chart_colors, Theme::default().chart_colors);
    }

    #[test]
    fn test_severity_colors_differ() {
        let theme = Theme::default();
        let styles = [
            theme.severity_style(Severity::Info),
            theme.severity_style(Severity::Success),
            theme.severity_style(Severity::Warning),
            theme.severity_style(Severity::Error),
        ];
        for (i, a) in styles.iter().enumerate() {
            for b in &styles[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
