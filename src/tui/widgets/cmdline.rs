//! Command line: status messages and prompts.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::widgets::Paragraph;

use crate::tui::state::{AppState, ColorTarget};
use crate::tui::style::Styles;

/// Draws the active prompt (placing the caret after the typed text) or,
/// without one, the last status message.
pub fn render_cmdline(frame: &mut Frame, area: Rect, state: &AppState) {
    let style = Styles::area(&state.palette, ColorTarget::Messages);
    match &state.prompt {
        Some(prompt) => {
            let text = format!("{}{}", prompt.label, prompt.text);
            let caret = text.chars().count() as u16;
            frame.render_widget(Paragraph::new(text).style(style), area);
            if area.width > 0 {
                frame.set_cursor_position(Position::new(
                    area.x + caret.min(area.width - 1),
                    area.y,
                ));
            }
        }
        None => {
            frame.render_widget(Paragraph::new(state.status.as_str()).style(style), area);
        }
    }
}
