//! Terminal access: drawing frames and reading keys.
//!
//! The engine polls for keys between refreshes; prompts and popups wait
//! for them. That choice is a mode flag on the console, switched for the
//! duration of a prompt by [`BlockingInput`].

use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{CrosstermBackend, TestBackend};
use ratatui::layout::Size;

use super::render::render;
use super::state::AppState;

/// How [`Console::next_key`] waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Wait at most the given timeout.
    Polling,
    /// Wait until a key arrives, ignoring the timeout.
    Blocking,
}

/// Display and keyboard capability used by the engine.
pub trait Console {
    fn draw(&mut self, state: &AppState) -> io::Result<()>;

    /// Next key press. In polling mode returns `None` once `timeout`
    /// elapses without one.
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;

    fn key_mode(&self) -> KeyMode;

    fn set_key_mode(&mut self, mode: KeyMode);

    /// Current screen size.
    fn size(&self) -> io::Result<Size>;

    /// Hands the terminal to another program.
    fn suspend(&mut self) -> io::Result<()>;

    /// Takes the terminal back after [`suspend`](Self::suspend).
    fn resume(&mut self) -> io::Result<()>;
}

/// Switches a console to blocking key mode until dropped.
pub struct BlockingInput<'a, C: Console + ?Sized> {
    console: &'a mut C,
    previous: KeyMode,
}

impl<'a, C: Console + ?Sized> BlockingInput<'a, C> {
    pub fn new(console: &'a mut C) -> Self {
        let previous = console.key_mode();
        console.set_key_mode(KeyMode::Blocking);
        Self { console, previous }
    }
}

impl<C: Console + ?Sized> Deref for BlockingInput<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.console
    }
}

impl<C: Console + ?Sized> DerefMut for BlockingInput<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.console
    }
}

impl<C: Console + ?Sized> Drop for BlockingInput<'_, C> {
    fn drop(&mut self) {
        self.console.set_key_mode(self.previous);
    }
}

/// The real terminal.
pub struct CrosstermConsole {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    mode: KeyMode,
}

impl CrosstermConsole {
    /// Enters raw mode and the alternate screen.
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            terminal,
            mode: KeyMode::Polling,
        })
    }

    /// Leaves the alternate screen and restores the cursor.
    pub fn restore(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }
}

impl Drop for CrosstermConsole {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

fn key_press(event: Event) -> Option<KeyEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(key),
        _ => None,
    }
}

impl Console for CrosstermConsole {
    fn draw(&mut self, state: &AppState) -> io::Result<()> {
        self.terminal.draw(|frame| render(frame, state))?;
        Ok(())
    }

    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        match self.mode {
            KeyMode::Polling => {
                if event::poll(timeout)? {
                    return Ok(key_press(event::read()?));
                }
                Ok(None)
            }
            KeyMode::Blocking => loop {
                if let Some(key) = key_press(event::read()?) {
                    return Ok(Some(key));
                }
            },
        }
    }

    fn key_mode(&self) -> KeyMode {
        self.mode
    }

    fn set_key_mode(&mut self, mode: KeyMode) {
        self.mode = mode;
    }

    fn size(&self) -> io::Result<Size> {
        self.terminal.size()
    }

    fn suspend(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }

    fn resume(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        execute!(self.terminal.backend_mut(), EnterAlternateScreen)?;
        self.terminal.clear()
    }
}

/// In-memory console fed from a key script, for driving the engine in
/// tests.
///
/// Each script step is one answer to a key poll: `Some(key)` delivers a
/// key, `None` lets the poll time out. Blocking reads skip `None` steps.
/// An exhausted script times out in polling mode and fails in blocking
/// mode.
pub struct ScriptedConsole {
    terminal: Terminal<TestBackend>,
    script: VecDeque<Option<KeyEvent>>,
    mode: KeyMode,
    suspended: usize,
}

impl ScriptedConsole {
    pub fn new(
        width: u16,
        height: u16,
        script: impl IntoIterator<Item = Option<KeyEvent>>,
    ) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(TestBackend::new(width, height))?,
            script: script.into_iter().collect(),
            mode: KeyMode::Polling,
            suspended: 0,
        })
    }

    /// Appends steps to the script.
    pub fn feed(&mut self, steps: impl IntoIterator<Item = Option<KeyEvent>>) {
        self.script.extend(steps);
    }

    /// Screen contents of the last drawn frame, one string per row.
    pub fn screen(&self) -> Vec<String> {
        let buffer = self.terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    /// How many times the terminal was handed over.
    pub fn suspended(&self) -> usize {
        self.suspended
    }
}

impl Console for ScriptedConsole {
    fn draw(&mut self, state: &AppState) -> io::Result<()> {
        self.terminal.draw(|frame| render(frame, state))?;
        Ok(())
    }

    fn next_key(&mut self, _timeout: Duration) -> io::Result<Option<KeyEvent>> {
        match self.mode {
            KeyMode::Polling => Ok(self.script.pop_front().flatten()),
            KeyMode::Blocking => {
                while let Some(step) = self.script.pop_front() {
                    if step.is_some() {
                        return Ok(step);
                    }
                }
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "key script exhausted while waiting for input",
                ))
            }
        }
    }

    fn key_mode(&self) -> KeyMode {
        self.mode
    }

    fn set_key_mode(&mut self, mode: KeyMode) {
        self.mode = mode;
    }

    fn size(&self) -> io::Result<Size> {
        self.terminal.size()
    }

    fn suspend(&mut self) -> io::Result<()> {
        self.suspended += 1;
        Ok(())
    }

    fn resume(&mut self) -> io::Result<()> {
        Ok(())
    }
}
