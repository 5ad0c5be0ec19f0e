//! TUI widgets for pgbtop.

mod answer;
mod cmdline;
mod colors;
mod help;
mod log_view;
mod summary;

pub use answer::render_answer;
pub use cmdline::render_cmdline;
pub use colors::render_colors;
pub use help::render_help;
pub use log_view::{LOG_CHROME, render_log};
pub use summary::{SUMMARY_HEIGHT, render_summary};

use ratatui::layout::Rect;

/// Centered popup area, clamped to the screen.
pub(crate) fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width);
    let popup_height = height.min(area.height);
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}
