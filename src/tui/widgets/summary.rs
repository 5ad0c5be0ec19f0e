//! Summary pane: clock, load, CPU, current console and pooler counters.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::state::{AppState, ColorTarget};
use crate::tui::style::Styles;

/// Rows taken by the summary pane.
pub const SUMMARY_HEIGHT: u16 = 4;

const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");

pub fn render_summary(frame: &mut Frame, area: Rect, state: &AppState) {
    let style = Styles::area(&state.palette, ColorTarget::Summary);
    let paragraph = Paragraph::new(summary_lines(state)).style(style);
    frame.render_widget(paragraph, area);
}

fn summary_lines(state: &AppState) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(SUMMARY_HEIGHT as usize);

    let load = match &state.load {
        Some(l) => format!("{:.2}, {:.2}, {:.2}", l.load1, l.load5, l.load15),
        None => "-, -, -".to_string(),
    };
    lines.push(Line::from(format!(
        "{}: {}, load average: {}",
        PROGRAM_NAME, state.clock, load
    )));

    let cpu = &state.cpu;
    let mut cpu_line = vec![Span::raw(format!(
        "      %cpu: {:4.1} us, {:4.1} sy, {:4.1} ni, {:4.1} id, {:4.1} wa, {:4.1} hi, {:4.1} si, {:4.1} st",
        cpu.user, cpu.system, cpu.nice, cpu.idle, cpu.iowait, cpu.hardirq, cpu.softirq, cpu.steal
    ))];
    if cpu.stale {
        cpu_line.push(Span::styled(" (stale)", Styles::dim()));
    }
    lines.push(Line::from(cpu_line));

    match &state.console {
        Some(console) => {
            let (label, connected) = if console.connected {
                ("ok", true)
            } else {
                ("failed", false)
            };
            lines.push(Line::from(vec![
                Span::raw(format!(
                    " console {}: {}    connection state: ",
                    console.number, console.pooler
                )),
                Span::styled(label, Styles::link_state(connected)),
            ]));
        }
        None => lines.push(Line::from(" console -: no connection")),
    }

    let count = |n: Option<usize>| n.map_or_else(|| "-".to_string(), |n| n.to_string());
    lines.push(Line::from(format!(
        " pgbouncer: pools: {:<5} databases: {:<5} clients: {:<5} servers: {:<5}",
        count(state.pooler.pools),
        count(state.pooler.databases),
        count(state.pooler.clients),
        count(state.pooler.servers)
    )));

    lines
}
