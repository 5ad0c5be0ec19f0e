//! Launches the user's editor on a file.

use std::env;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Used when `$EDITOR` is unset or empty.
pub const DEFAULT_EDITOR: &str = "vim";

/// Editor command line from `$EDITOR`, split on whitespace.
pub fn editor_command() -> Vec<String> {
    let configured = env::var("EDITOR").unwrap_or_default();
    parse_editor(&configured)
}

fn parse_editor(value: &str) -> Vec<String> {
    let parts: Vec<String> = value.split_whitespace().map(String::from).collect();
    if parts.is_empty() {
        vec![DEFAULT_EDITOR.to_string()]
    } else {
        parts
    }
}

/// Runs the editor on `path` and waits for it to exit.
///
/// The caller must hand the terminal over first.
pub fn edit_file(path: &Path) -> io::Result<ExitStatus> {
    let command = editor_command();
    let (program, args) = command
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no editor configured"))?;
    Command::new(program).args(args).arg(path).status()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_editor() {
        assert_eq!(parse_editor(""), vec!["vim"]);
        assert_eq!(parse_editor("   "), vec!["vim"]);
        assert_eq!(parse_editor("nano"), vec!["nano"]);
        assert_eq!(parse_editor("code --wait"), vec!["code", "--wait"]);
    }
}
