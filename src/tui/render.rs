//! Main rendering logic for TUI.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect, Size};

use super::state::{AppState, Popup};
use super::widgets::{
    LOG_CHROME, SUMMARY_HEIGHT, render_answer, render_cmdline, render_colors, render_help,
    render_log, render_summary,
};

/// Screen areas of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panes {
    pub summary: Rect,
    pub cmdline: Rect,
    pub answer: Rect,
    /// Bottom third of the screen while the log view is open.
    pub log: Option<Rect>,
}

/// Splits `area` into panes.
pub fn layout(area: Rect, log_open: bool) -> Panes {
    if log_open {
        let chunks = Layout::vertical([
            Constraint::Length(SUMMARY_HEIGHT),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(area.height / 3),
        ])
        .split(area);
        Panes {
            summary: chunks[0],
            cmdline: chunks[1],
            answer: chunks[2],
            log: Some(chunks[3]),
        }
    } else {
        let chunks = Layout::vertical([
            Constraint::Length(SUMMARY_HEIGHT),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);
        Panes {
            summary: chunks[0],
            cmdline: chunks[1],
            answer: chunks[2],
            log: None,
        }
    }
}

/// Number of log lines that fit on a screen of `size`.
pub fn log_viewport_height(size: Size) -> usize {
    let area = Rect::new(0, 0, size.width, size.height);
    layout(area, true)
        .log
        .map_or(0, |log| usize::from(log.height.saturating_sub(LOG_CHROME)))
}

/// Main render function.
pub fn render(frame: &mut Frame, state: &AppState) {
    let area = frame.area();
    let panes = layout(area, state.log_lines.is_some());

    render_summary(frame, panes.summary, state);
    render_cmdline(frame, panes.cmdline, state);
    render_answer(frame, panes.answer, state);
    if let Some(log) = panes.log {
        render_log(frame, log, state);
    }

    // Popups are rendered last to overlay everything.
    match &state.popup {
        Popup::None => {}
        Popup::Help => render_help(frame, area),
        Popup::Colors(editor) => render_colors(frame, area, &state.palette, editor),
    }
}
