//! Color scheme popup.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::popup_area;
use crate::tui::state::{ColorEditor, ColorTarget, Palette};
use crate::tui::style::{Styles, palette_color};

const TARGETS: [(ColorTarget, &str); 4] = [
    (ColorTarget::Summary, "summary"),
    (ColorTarget::Messages, "messages and prompts"),
    (ColorTarget::Answer, "pooler answer"),
    (ColorTarget::Log, "log"),
];

const COLOR_NAMES: [&str; 8] = [
    "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
];

pub fn render_colors(frame: &mut Frame, area: Rect, palette: &Palette, editor: &ColorEditor) {
    let popup = popup_area(area, 64, 15);
    frame.render_widget(Clear, popup);

    let mut lines = vec![Line::from(Span::styled(
        "Color mapping",
        Styles::section_header(),
    ))];
    for (target, name) in TARGETS {
        let marker = if target == editor.target { ">" } else { " " };
        let color = palette.get(target);
        lines.push(Line::from(vec![
            Span::raw(format!("{} ", marker)),
            Span::styled(target.key().to_string(), Styles::help_key()),
            Span::raw(format!(" {:<22}", name)),
            Span::styled(
                format!("{} = {}", color, COLOR_NAMES[usize::from(color.min(7))]),
                Styles::area(palette, target),
            ),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::raw(format!(
        "1) Select a target as an upper case letter, current: {}",
        editor.target.key()
    )));
    lines.push(Line::raw(format!(
        "2) Select a color as a number, current: {}",
        palette.get(editor.target)
    )));
    for (chunk, names) in COLOR_NAMES.chunks(4).enumerate() {
        let mut legend: Vec<Span> = vec![Span::raw("   ")];
        for (offset, name) in names.iter().enumerate() {
            let index = (chunk * 4 + offset) as u8;
            legend.push(Span::styled(
                format!("{}={:<9}", index, name),
                Style::default().fg(palette_color(index)),
            ));
        }
        lines.push(Line::from(legend));
    }
    lines.push(Line::raw("3) Esc aborts changes, Enter commits"));

    let block = Block::default()
        .title(" Colors ")
        .borders(Borders::ALL)
        .border_style(Styles::popup_border());
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}
