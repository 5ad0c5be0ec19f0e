//! Terminal user interface for pgbtop.
//!
//! The engine ([`App`]) owns the session registry and refreshes the
//! screen once per interval; everything it draws goes through a
//! [`Console`], so tests can drive it with a key script.

mod app;
mod console;
mod input;
mod input_line;
mod render;
mod state;
mod style;
mod widgets;

pub use app::{App, AppConfig};
pub use console::{BlockingInput, Console, CrosstermConsole, KeyMode, ScriptedConsole};
pub use input::{AdminKey, KeyAction, handle_key};
pub use input_line::{InputLine, LineState};
pub use state::{AppState, ColorTarget, Palette, Popup};
