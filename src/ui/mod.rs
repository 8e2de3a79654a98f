//! Terminal User Interface components for covid-tui.

pub mod chart;
mod help;
mod theme;
pub mod widgets;

pub use help::{Dialog, HelpOverlay};
pub use theme::Theme;
