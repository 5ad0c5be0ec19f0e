//! Application state for TUI.

use std::time::Duration;

use crate::collector::Utilization;
use crate::collector::procfs::LoadAvg;
use crate::pooler::{PoolerSummary, QueryContext, ResultSet};

/// Number of selectable colors (curses order: black, red, green, yellow,
/// blue, magenta, cyan, white).
pub const COLOR_COUNT: u8 = 8;

/// Screen area whose color can be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTarget {
    Summary,
    Messages,
    Answer,
    Log,
}

impl ColorTarget {
    /// Target selected by an upper-case key in the color popup.
    pub fn from_key(c: char) -> Option<Self> {
        match c {
            'S' => Some(ColorTarget::Summary),
            'M' => Some(ColorTarget::Messages),
            'P' => Some(ColorTarget::Answer),
            'L' => Some(ColorTarget::Log),
            _ => None,
        }
    }

    pub fn key(self) -> char {
        match self {
            ColorTarget::Summary => 'S',
            ColorTarget::Messages => 'M',
            ColorTarget::Answer => 'P',
            ColorTarget::Log => 'L',
        }
    }
}

/// Foreground color index per screen area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub summary: u8,
    pub messages: u8,
    pub answer: u8,
    pub log: u8,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            summary: 7,
            messages: 7,
            answer: 7,
            log: 7,
        }
    }
}

impl Palette {
    pub fn get(&self, target: ColorTarget) -> u8 {
        match target {
            ColorTarget::Summary => self.summary,
            ColorTarget::Messages => self.messages,
            ColorTarget::Answer => self.answer,
            ColorTarget::Log => self.log,
        }
    }

    /// Sets the color of `target`. Out-of-range colors are ignored.
    pub fn set(&mut self, target: ColorTarget, color: u8) {
        if color >= COLOR_COUNT {
            return;
        }
        match target {
            ColorTarget::Summary => self.summary = color,
            ColorTarget::Messages => self.messages = color,
            ColorTarget::Answer => self.answer = color,
            ColorTarget::Log => self.log = color,
        }
    }
}

/// Color popup state: the target being edited and the palette to restore
/// on Esc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorEditor {
    pub target: ColorTarget,
    pub saved: Palette,
}

/// Modal overlay currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Popup {
    #[default]
    None,
    Help,
    Colors(ColorEditor),
}

/// Prompt shown in the command line while the user types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptView {
    pub label: String,
    pub text: String,
}

/// The summary pane's console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    /// 1-based console number.
    pub number: usize,
    pub pooler: String,
    pub connected: bool,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Local time of the last refresh.
    pub clock: String,
    pub load: Option<LoadAvg>,
    pub cpu: Utilization,
    pub console: Option<ConsoleLine>,
    pub pooler: PoolerSummary,

    pub context: QueryContext,
    /// Last result set that was successfully fetched for `context`.
    pub answer: Option<ResultSet>,
    /// The latest query for `context` returned no data.
    pub answer_failed: bool,

    /// `Some` while the log view is open for the current session.
    pub log_lines: Option<Vec<String>>,

    /// One-line status message.
    pub status: String,
    pub prompt: Option<PromptView>,
    pub popup: Popup,
    pub palette: Palette,
    pub interval: Duration,
}

impl AppState {
    pub fn new(interval: Duration) -> Self {
        Self {
            clock: String::new(),
            load: None,
            cpu: Utilization::default(),
            console: None,
            pooler: PoolerSummary::default(),
            context: QueryContext::default(),
            answer: None,
            answer_failed: false,
            log_lines: None,
            status: String::new(),
            prompt: None,
            popup: Popup::None,
            palette: Palette::default(),
            interval,
        }
    }

    /// Switches the answer pane to another view, dropping the old table.
    pub fn set_context(&mut self, context: QueryContext) {
        if self.context != context {
            self.answer = None;
            self.answer_failed = false;
        }
        self.context = context;
    }

    /// Records a query outcome. A failure keeps the last good table.
    pub fn apply_answer(&mut self, answer: Option<ResultSet>) {
        match answer {
            Some(rs) => {
                self.answer = Some(rs);
                self.answer_failed = false;
            }
            None => self.answer_failed = true,
        }
    }

    /// Forgets per-session data after the current session changed.
    pub fn reset_session_view(&mut self) {
        self.answer = None;
        self.answer_failed = false;
        self.log_lines = None;
        self.pooler = PoolerSummary::default();
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_set_and_get() {
        let mut palette = Palette::default();
        palette.set(ColorTarget::Log, 2);
        palette.set(ColorTarget::Summary, 9);
        assert_eq!(palette.get(ColorTarget::Log), 2);
        assert_eq!(palette.get(ColorTarget::Summary), 7);
    }

    #[test]
    fn test_color_target_keys() {
        for c in ['S', 'M', 'P', 'L'] {
            assert_eq!(ColorTarget::from_key(c).map(ColorTarget::key), Some(c));
        }
        assert_eq!(ColorTarget::from_key('s'), None);
    }

    #[test]
    fn test_failed_answer_keeps_previous_table() {
        let mut state = AppState::new(Duration::from_secs(1));
        let rs = ResultSet::new(vec!["database".into()], vec![vec!["app".into()]]);
        state.apply_answer(Some(rs.clone()));
        state.apply_answer(None);
        assert_eq!(state.answer, Some(rs.clone()));
        assert!(state.answer_failed);

        state.apply_answer(Some(rs));
        assert!(!state.answer_failed);
    }

    #[test]
    fn test_context_switch_drops_table() {
        let mut state = AppState::new(Duration::from_secs(1));
        state.apply_answer(Some(ResultSet::default()));
        state.set_context(QueryContext::Pools);
        assert!(state.answer.is_some());
        state.set_context(QueryContext::Clients);
        assert!(state.answer.is_none());
    }
}
