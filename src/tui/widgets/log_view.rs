//! Pooler log pane.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::tui::state::{AppState, ColorTarget};
use crate::tui::style::Styles;

/// Rows of the pane taken by its title border.
pub const LOG_CHROME: u16 = 1;

pub fn render_log(frame: &mut Frame, area: Rect, state: &AppState) {
    let lines: Vec<Line> = state
        .log_lines
        .iter()
        .flatten()
        .map(|l| Line::raw(l.as_str()))
        .collect();
    let block = Block::default()
        .title(" log ")
        .borders(Borders::TOP)
        .style(Styles::area(&state.palette, ColorTarget::Log));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
