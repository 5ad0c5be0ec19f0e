//! Input handling and keybindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::pooler::QueryContext;

/// Admin commands reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminKey {
    Reload,
    Pause,
    Resume,
    Suspend,
    Kill,
    Shutdown,
}

/// What a key press in the main view asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Switch to a 0-based session slot.
    SwitchSession(usize),
    Show(QueryContext),
    Admin(AdminKey),
    AddSession,
    CloseSession,
    WriteBookmarks,
    ToggleLog,
    EditConfig,
    ChangeInterval,
    ChangeColors,
    Help,
    Unknown,
}

/// Maps a key press to an action.
pub fn handle_key(key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('d') | KeyCode::Char('D') => KeyAction::CloseSession,
            KeyCode::Char('c') => KeyAction::Quit,
            _ => KeyAction::Unknown,
        };
    }

    let KeyCode::Char(c) = key.code else {
        return KeyAction::Unknown;
    };

    match c {
        '1'..='8' => KeyAction::SwitchSession(c as usize - '1' as usize),

        // Views
        'p' => KeyAction::Show(QueryContext::Pools),
        'c' => KeyAction::Show(QueryContext::Clients),
        's' => KeyAction::Show(QueryContext::Servers),
        'd' => KeyAction::Show(QueryContext::Databases),
        'a' => KeyAction::Show(QueryContext::Stats),
        'C' => KeyAction::Show(QueryContext::Config),

        // Admin commands
        'M' => KeyAction::Admin(AdminKey::Reload),
        'P' => KeyAction::Admin(AdminKey::Pause),
        'R' => KeyAction::Admin(AdminKey::Resume),
        'S' => KeyAction::Admin(AdminKey::Suspend),
        'K' => KeyAction::Admin(AdminKey::Kill),
        'Z' => KeyAction::Admin(AdminKey::Shutdown),

        // Sessions
        'N' => KeyAction::AddSession,
        'W' => KeyAction::WriteBookmarks,

        'L' => KeyAction::ToggleLog,
        'E' => KeyAction::EditConfig,
        'I' => KeyAction::ChangeInterval,
        'i' => KeyAction::ChangeColors,
        'h' => KeyAction::Help,
        'q' => KeyAction::Quit,
        _ => KeyAction::Unknown,
    }
}
