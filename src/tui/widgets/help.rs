//! Help popup listing every interactive command.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use super::popup_area;
use crate::tui::style::Styles;

const KEYS: &[(&str, &str)] = &[
    ("1..8", "switch between consoles"),
    ("p c s d a", "show pools, clients, servers, databases, stats"),
    ("C", "show config"),
    ("M", "reload"),
    ("P R", "pause, resume (one database or all)"),
    ("S", "suspend"),
    ("K", "kill a database"),
    ("Z", "shutdown (confirm with YES)"),
    ("N", "add new connection"),
    ("Ctrl+D", "close current connection"),
    ("W", "write connections to the bookmarks file"),
    ("L", "show log file (local poolers only)"),
    ("E", "edit config in $EDITOR (local poolers only)"),
    ("I", "set refresh interval"),
    ("i", "change color scheme"),
    ("h", "show this help"),
    ("q", "quit"),
];

pub fn render_help(frame: &mut Frame, area: Rect) {
    let popup = popup_area(area, 70, KEYS.len() as u16 + 6);
    frame.render_widget(Clear, popup);

    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "Interactive commands - {} {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ),
            Styles::section_header(),
        )),
        Line::raw(""),
    ];
    lines.extend(KEYS.iter().map(|(key, what)| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", key), Styles::help_key()),
            Span::raw(*what),
        ])
    }));
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::styled("Press ", Styles::dim()),
        Span::styled("Esc", Styles::help_key()),
        Span::styled(" to continue", Styles::dim()),
    ]));

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Styles::popup_border());
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup);
}
