//! Single-line editor used by every prompt.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Where an edit session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineState {
    Editing,
    Committed(String),
    Cancelled,
}

/// Line editing state machine.
///
/// Printable characters append, Backspace/Delete remove the last one, Enter
/// commits (an empty line is a valid answer) and Esc cancels. Once committed
/// or cancelled, keys are ignored until [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct InputLine {
    buffer: String,
    capacity: usize,
    masked: bool,
    state: LineState,
}

impl InputLine {
    /// An editor accepting at most `capacity` characters.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: String::new(),
            capacity,
            masked: false,
            state: LineState::Editing,
        }
    }

    /// Like [`new`](Self::new), but displays `*` for every character.
    pub fn masked(capacity: usize) -> Self {
        Self {
            masked: true,
            ..Self::new(capacity)
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> &LineState {
        if self.state != LineState::Editing {
            return &self.state;
        }

        match key.code {
            KeyCode::Esc => {
                self.buffer.clear();
                self.state = LineState::Cancelled;
            }
            KeyCode::Enter => {
                self.state = LineState::Committed(std::mem::take(&mut self.buffer));
            }
            KeyCode::Backspace | KeyCode::Delete => {
                self.buffer.pop();
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                if self.len() < self.capacity {
                    self.buffer.push(c);
                }
            }
            _ => {}
        }
        &self.state
    }

    pub fn state(&self) -> &LineState {
        &self.state
    }

    /// Number of characters typed so far; also the caret offset from the
    /// prompt column.
    pub fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Text to draw after the prompt label.
    pub fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.len())
        } else {
            self.buffer.clone()
        }
    }

    /// Clears the buffer and starts a new edit session.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = LineState::Editing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(line: &mut InputLine, s: &str) {
        for c in s.chars() {
            line.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_edit_and_commit() {
        let mut line = InputLine::new(32);
        type_str(&mut line, "abc");
        line.handle_key(key(KeyCode::Backspace));
        line.handle_key(key(KeyCode::Backspace));
        type_str(&mut line, "x");
        assert_eq!(
            line.handle_key(key(KeyCode::Enter)),
            &LineState::Committed("ax".into())
        );
    }

    #[test]
    fn test_escape_cancels() {
        let mut line = InputLine::new(32);
        type_str(&mut line, "abc");
        assert_eq!(line.handle_key(key(KeyCode::Esc)), &LineState::Cancelled);
        assert!(line.is_empty());
    }

    #[test]
    fn test_empty_commit() {
        let mut line = InputLine::new(8);
        assert_eq!(
            line.handle_key(key(KeyCode::Enter)),
            &LineState::Committed(String::new())
        );
    }

    #[test]
    fn test_backspace_on_empty_keeps_caret() {
        let mut line = InputLine::new(8);
        line.handle_key(key(KeyCode::Backspace));
        line.handle_key(key(KeyCode::Delete));
        assert_eq!(line.len(), 0);
        assert_eq!(line.state(), &LineState::Editing);
    }

    #[test]
    fn test_capacity() {
        let mut line = InputLine::new(3);
        type_str(&mut line, "abcdef");
        assert_eq!(line.display(), "abc");
        line.handle_key(key(KeyCode::Backspace));
        type_str(&mut line, "z");
        assert_eq!(line.display(), "abz");
    }

    #[test]
    fn test_terminal_states_ignore_keys_until_reset() {
        let mut line = InputLine::new(8);
        type_str(&mut line, "ok");
        line.handle_key(key(KeyCode::Enter));
        type_str(&mut line, "more");
        line.handle_key(key(KeyCode::Esc));
        assert_eq!(line.state(), &LineState::Committed("ok".into()));

        line.reset();
        assert_eq!(line.state(), &LineState::Editing);
        type_str(&mut line, "y");
        assert_eq!(line.display(), "y");
    }

    #[test]
    fn test_masked_display() {
        let mut line = InputLine::masked(16);
        type_str(&mut line, "secret");
        assert_eq!(line.display(), "******");
        assert_eq!(
            line.handle_key(key(KeyCode::Enter)),
            &LineState::Committed("secret".into())
        );
    }

    #[test]
    fn test_control_chars_are_not_typed() {
        let mut line = InputLine::new(8);
        line.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        line.handle_key(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT));
        assert_eq!(line.display(), "A");
    }
}
