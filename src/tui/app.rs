//! Main TUI application.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, info, warn};

use crate::collector::{CpuSampler, FileSystem, LogCursor};
use crate::pooler::dispatch::{config_value, query, run_admin, summary};
use crate::pooler::{AdminCommand, Connector, DispatchError, LinkStatus, QueryContext};
use crate::session::bookmarks;
use crate::session::{
    CloseOutcome, Descriptor, MAX_SESSIONS, RECONNECT_MESSAGE, Reconnect, Registry, Session,
};
use crate::util::{edit_file, is_local_host};

use super::console::{BlockingInput, Console};
use super::input::{AdminKey, KeyAction, handle_key};
use super::input_line::{InputLine, LineState};
use super::render::log_viewport_height;
use super::state::{AppState, ColorEditor, ColorTarget, ConsoleLine, Popup, PromptView};

const UNKNOWN_COMMAND: &str = "Unknown command - try 'h' for help.";
const CANCELED: &str = "Do nothing. Operation canceled.";
const NOT_LOCAL: &str = "Do nothing. Current pgbouncer not local.";

const ADD_PROMPT: &str =
    "Enter new connection parameters, format \"host port username dbname\": ";
const PASSWORD_PROMPT: &str = "Required password: ";

/// Longest text accepted by the general prompts.
const PROMPT_CAPACITY: usize = 256;
const PASSWORD_CAPACITY: usize = 128;

/// Startup options of the engine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub interval: Duration,
    /// Where `W` writes bookmarks. `None` when no home directory is known.
    pub rc_path: Option<PathBuf>,
}

/// Main TUI application.
pub struct App<F: FileSystem> {
    registry: Registry,
    connector: Box<dyn Connector>,
    sampler: CpuSampler<F>,
    state: AppState,
    rc_path: Option<PathBuf>,
    should_quit: bool,
}

impl<F: FileSystem> App<F> {
    pub fn new(
        registry: Registry,
        connector: Box<dyn Connector>,
        sampler: CpuSampler<F>,
        config: AppConfig,
    ) -> Self {
        Self {
            registry,
            connector,
            sampler,
            state: AppState::new(config.interval),
            rc_path: config.rc_path,
            should_quit: false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs until the user quits or the last session is closed.
    ///
    /// Keys already waiting are handled before the next refresh, so a
    /// burst of input is not delayed by one interval per key.
    pub fn run(&mut self, console: &mut dyn Console) -> io::Result<()> {
        info!(sessions = self.registry.active_count(), "engine started");
        while !self.should_quit {
            if let Some(key) = console.next_key(Duration::ZERO)? {
                self.dispatch(console, key)?;
                continue;
            }

            self.refresh(console)?;
            console.draw(&self.state)?;

            if let Some(key) = console.next_key(self.state.interval)? {
                self.dispatch(console, key)?;
            }
        }
        self.registry.close_all();
        info!("engine stopped");
        Ok(())
    }

    /// One tick: reconnect if needed, resample, re-query.
    fn refresh(&mut self, console: &dyn Console) -> io::Result<()> {
        let slot = self.registry.current();
        match self.registry.reconnect_if_down(self.connector.as_ref(), slot) {
            Reconnect::Healthy => {}
            Reconnect::Restored | Reconnect::Failed(_) => self.state.set_status(RECONNECT_MESSAGE),
        }

        self.state.cpu = self.sampler.sample();
        self.state.load = self.sampler.load_average().ok();
        self.state.clock = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let log_height = log_viewport_height(console.size()?);
        let context = self.state.context;
        let Some(session) = self.registry.current_session_mut() else {
            self.state.console = None;
            return Ok(());
        };

        self.state.console = Some(ConsoleLine {
            number: slot + 1,
            pooler: session.descriptor().to_string(),
            connected: session.status() == LinkStatus::Ok,
        });
        self.state.pooler = session
            .with_link(|link| summary(link))
            .unwrap_or_default();
        let answer = session
            .with_link(|link| query(link, context).ok())
            .flatten();
        self.state.apply_answer(answer);

        self.state.log_lines = match session.log_mut() {
            None => None,
            Some(cursor) => match cursor.tail(log_height) {
                Ok(lines) => Some(lines),
                Err(e) => {
                    warn!(path = %cursor.path().display(), error = %e, "log read failed");
                    self.state.set_status(format!(
                        "Failed to read {}: {}",
                        cursor.path().display(),
                        e
                    ));
                    Some(Vec::new())
                }
            },
        };
        Ok(())
    }

    fn dispatch(&mut self, console: &mut dyn Console, key: KeyEvent) -> io::Result<()> {
        let action = handle_key(key);
        debug!(?action, "key");
        match action {
            KeyAction::Quit => self.should_quit = true,
            KeyAction::SwitchSession(slot) => self.switch_session(slot),
            KeyAction::Show(context) => self.show(context),
            KeyAction::Admin(kind) => self.admin(console, kind)?,
            KeyAction::AddSession => self.add_session(console)?,
            KeyAction::CloseSession => self.close_session(),
            KeyAction::WriteBookmarks => self.write_bookmarks(),
            KeyAction::ToggleLog => self.toggle_log(),
            KeyAction::EditConfig => self.edit_config(console)?,
            KeyAction::ChangeInterval => self.change_interval(console)?,
            KeyAction::ChangeColors => self.change_colors(console)?,
            KeyAction::Help => self.show_help(console)?,
            KeyAction::Unknown => self.state.set_status(UNKNOWN_COMMAND),
        }
        Ok(())
    }

    /// Reads a line, reporting cancellation in the status line.
    fn prompt(&mut self, console: &mut dyn Console, label: &str) -> io::Result<Option<String>> {
        let answer = read_line(
            &mut self.state,
            console,
            label,
            InputLine::new(PROMPT_CAPACITY),
        )?;
        if answer.is_none() {
            self.state.set_status(CANCELED);
        }
        Ok(answer)
    }

    fn show(&mut self, context: QueryContext) {
        self.state.set_context(context);
        self.state.set_status(format!("Show {}", context.label()));
    }

    fn switch_session(&mut self, slot: usize) {
        let current = self.registry.current();
        if self.registry.switch_to(slot) {
            if slot != current {
                self.state.reset_session_view();
            }
            self.state.set_status(format!(
                "Switch to another pgbouncer connection (console {})",
                slot + 1
            ));
        } else {
            self.state.set_status(format!(
                "Do not switch because no connection associated (stay on console {})",
                current + 1
            ));
        }
    }

    fn admin(&mut self, console: &mut dyn Console, kind: AdminKey) -> io::Result<()> {
        let command = match kind {
            AdminKey::Reload => AdminCommand::Reload,
            AdminKey::Suspend => AdminCommand::Suspend,
            AdminKey::Pause => {
                match self.prompt(console, "Database to pause [default database = all] ")? {
                    Some(db) => AdminCommand::Pause(db),
                    None => return Ok(()),
                }
            }
            AdminKey::Resume => {
                match self.prompt(console, "Database to resume [default database = all] ")? {
                    Some(db) => AdminCommand::Resume(db),
                    None => return Ok(()),
                }
            }
            AdminKey::Kill => {
                match self.prompt(console, "Database to kill [must not be empty]: ")? {
                    Some(db) => AdminCommand::Kill(db),
                    None => return Ok(()),
                }
            }
            AdminKey::Shutdown => {
                match self.prompt(console, "Shutdown pgbouncer. Press YES to confirm. ")? {
                    Some(answer) => AdminCommand::Shutdown(answer),
                    None => return Ok(()),
                }
            }
        };

        let Some(session) = self.registry.current_session_mut() else {
            self.state.set_status("Nothing to do.");
            return Ok(());
        };
        let outcome = session.with_link(|link| run_admin(link, &command));
        let message = match outcome {
            Some(Ok(())) => command.success_message(),
            Some(Err(DispatchError::CommandFailed(text))) => command.failure_message(&text),
            Some(Err(e)) => e.to_string(),
            None => RECONNECT_MESSAGE.to_string(),
        };
        self.state.set_status(message);
        Ok(())
    }

    fn add_session(&mut self, console: &mut dyn Console) -> io::Result<()> {
        if self.registry.active_count() >= MAX_SESSIONS {
            self.state.set_status("No free consoles.");
            return Ok(());
        }
        let Some(input) = self.prompt(console, ADD_PROMPT)? else {
            return Ok(());
        };
        if input.trim().is_empty() {
            self.state.set_status("Nothing to do.");
            return Ok(());
        }
        let descriptor = match Descriptor::from_prompt(&input) {
            Ok(descriptor) => descriptor,
            Err(message) => {
                self.state.set_status(message);
                return Ok(());
            }
        };

        let state = &mut self.state;
        let mut prompt_error = None;
        let mut password_prompt = |_: &Descriptor| {
            match read_line(
                state,
                &mut *console,
                PASSWORD_PROMPT,
                InputLine::masked(PASSWORD_CAPACITY),
            ) {
                Ok(password) => password,
                Err(e) => {
                    prompt_error = Some(e);
                    None
                }
            }
        };
        let added =
            self.registry
                .add_session(self.connector.as_ref(), descriptor, &mut password_prompt);
        if let Some(e) = prompt_error {
            return Err(e);
        }

        match added {
            Ok(_) => {
                self.state.reset_session_view();
                self.state.set_status("Successfully connected.");
            }
            Err(e) => {
                warn!(error = %e, "add session failed");
                self.state.set_status(e.to_string());
            }
        }
        Ok(())
    }

    fn close_session(&mut self) {
        let slot = self.registry.current();
        match self.registry.close_session(slot) {
            CloseOutcome::Terminate => self.should_quit = true,
            CloseOutcome::Current(_) => {
                self.state.reset_session_view();
                self.state.set_status("Close current pgbouncer connection.");
            }
        }
    }

    fn write_bookmarks(&mut self) {
        let Some(path) = &self.rc_path else {
            self.state
                .set_status("Failed write configuration: home directory unknown.");
            return;
        };
        let descriptors = self.registry.sessions().map(Session::descriptor);
        let message = match bookmarks::write(path, descriptors) {
            Ok(()) => {
                info!(path = %path.display(), "bookmarks written");
                format!("Wrote configuration to '{}'", path.display())
            }
            Err(e) => {
                warn!(error = %e, "bookmarks write failed");
                format!("Failed write configuration to '{}'", path.display())
            }
        };
        self.state.set_status(message);
    }

    fn toggle_log(&mut self) {
        let Some(session) = self.registry.current_session_mut() else {
            return;
        };
        if session.close_log() {
            self.state.log_lines = None;
            self.state.set_status("Close current pgbouncer log.");
            return;
        }
        if !is_local_host(&session.descriptor().host) {
            self.state.set_status(NOT_LOCAL);
            return;
        }

        let Some(Ok(logfile)) = session.with_link(|link| config_value(link, "logfile")) else {
            self.state
                .set_status("Do nothing. Log file config option not found.");
            return;
        };
        match LogCursor::open(&logfile) {
            Ok(cursor) => {
                session.open_log(cursor);
                self.state.log_lines = Some(Vec::new());
                self.state
                    .set_status(format!("Open current pgbouncer log: {}", logfile));
            }
            Err(e) => {
                warn!(path = %logfile, error = %e, "log open failed");
                self.state
                    .set_status(format!("Do nothing. Failed to open {}", logfile));
            }
        }
    }

    fn edit_config(&mut self, console: &mut dyn Console) -> io::Result<()> {
        let Some(session) = self.registry.current_session_mut() else {
            return Ok(());
        };
        if !is_local_host(&session.descriptor().host) {
            self.state
                .set_status("Do nothing. Edit config not supported for remote pgbouncers.");
            return Ok(());
        }
        let Some(Ok(conffile)) = session.with_link(|link| config_value(link, "conffile")) else {
            self.state
                .set_status("Do nothing. Config file option not found.");
            return Ok(());
        };

        console.suspend()?;
        let edited = edit_file(Path::new(&conffile));
        console.resume()?;

        let message = match edited {
            Ok(status) if status.success() => format!("Edited {}", conffile),
            Ok(status) => format!("Editor exited with {} for {}", status, conffile),
            Err(e) => {
                warn!(path = %conffile, error = %e, "editor failed to start");
                format!("Failed to start editor for {}: {}", conffile, e)
            }
        };
        self.state.set_status(message);
        Ok(())
    }

    fn change_interval(&mut self, console: &mut dyn Console) -> io::Result<()> {
        let label = format!(
            "Change refresh interval from {:.1} to ",
            self.state.interval.as_secs_f64()
        );
        let Some(input) = self.prompt(console, &label)? else {
            return Ok(());
        };
        let input = input.trim();
        if input.is_empty() {
            self.state.set_status(CANCELED);
            return Ok(());
        }
        match input.parse::<f64>().ok().map(Duration::try_from_secs_f64) {
            Some(Ok(interval)) => {
                self.state.interval = interval;
                self.state.set_status(format!(
                    "Refresh interval set to {:.1} seconds.",
                    interval.as_secs_f64()
                ));
            }
            _ => self.state.set_status("Should be positive value."),
        }
        Ok(())
    }

    fn change_colors(&mut self, console: &mut dyn Console) -> io::Result<()> {
        self.state.popup = Popup::Colors(ColorEditor {
            target: ColorTarget::Summary,
            saved: self.state.palette,
        });
        let result = self.edit_colors(console);
        self.state.popup = Popup::None;
        result
    }

    fn edit_colors(&mut self, console: &mut dyn Console) -> io::Result<()> {
        let mut console = BlockingInput::new(console);
        loop {
            console.draw(&self.state)?;
            let Some(key) = console.next_key(Duration::ZERO)? else {
                continue;
            };
            let Popup::Colors(editor) = &mut self.state.popup else {
                return Ok(());
            };
            match key.code {
                KeyCode::Esc => {
                    self.state.palette = editor.saved;
                    self.state.set_status("Color scheme unchanged.");
                    return Ok(());
                }
                KeyCode::Enter => {
                    self.state.set_status("Color scheme updated.");
                    return Ok(());
                }
                KeyCode::Char(c) => {
                    if let Some(target) = ColorTarget::from_key(c) {
                        editor.target = target;
                    } else if let Some(color) = c.to_digit(10) {
                        self.state.palette.set(editor.target, color as u8);
                    }
                }
                _ => {}
            }
        }
    }

    fn show_help(&mut self, console: &mut dyn Console) -> io::Result<()> {
        self.state.popup = Popup::Help;
        let result = wait_for_close(&self.state, console);
        self.state.popup = Popup::None;
        result
    }
}

fn wait_for_close(state: &AppState, console: &mut dyn Console) -> io::Result<()> {
    let mut console = BlockingInput::new(console);
    loop {
        console.draw(state)?;
        if let Some(key) = console.next_key(Duration::ZERO)?
            && matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h'))
        {
            return Ok(());
        }
    }
}

/// Runs `line` in the command line until it is committed or cancelled.
///
/// Takes the state rather than the app so it can serve as the password
/// callback while the registry is borrowed.
fn read_line(
    state: &mut AppState,
    console: &mut dyn Console,
    label: &str,
    mut line: InputLine,
) -> io::Result<Option<String>> {
    let answer = edit_line(state, console, label, &mut line);
    state.prompt = None;
    answer
}

fn edit_line(
    state: &mut AppState,
    console: &mut dyn Console,
    label: &str,
    line: &mut InputLine,
) -> io::Result<Option<String>> {
    let mut console = BlockingInput::new(console);
    loop {
        state.prompt = Some(PromptView {
            label: label.to_string(),
            text: line.display(),
        });
        console.draw(state)?;
        let Some(key) = console.next_key(Duration::ZERO)? else {
            continue;
        };
        match line.handle_key(key) {
            LineState::Editing => {}
            LineState::Committed(text) => return Ok(Some(text.clone())),
            LineState::Cancelled => return Ok(None),
        }
    }
}
