//! Pooler answer pane: the table returned by the current `show` command.

use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};

use crate::tui::state::{AppState, ColorTarget};
use crate::tui::style::Styles;

pub fn render_answer(frame: &mut Frame, area: Rect, state: &AppState) {
    let style = Styles::area(&state.palette, ColorTarget::Answer);

    let mut title = format!(" show {} ", state.context.label());
    if state.answer_failed {
        title.push_str("(no data) ");
    }
    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::TOP)
        .style(style);

    let Some(rs) = &state.answer else {
        let paragraph = Paragraph::new("No data available").block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let widths: Vec<Constraint> = rs
        .widths()
        .into_iter()
        .map(|w| Constraint::Length(w as u16))
        .collect();
    let header = Row::new(rs.columns.iter().map(String::as_str))
        .style(Styles::table_header(&state.palette))
        .height(1);
    let rows = rs
        .rows
        .iter()
        .map(|row| Row::new(row.iter().map(String::as_str)).height(1));

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(0)
        .block(block);
    frame.render_widget(table, area);
}
