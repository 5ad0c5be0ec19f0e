//! Host-side helpers for pgbtop.

mod editor;
mod local;

pub use editor::{DEFAULT_EDITOR, edit_file, editor_command};
pub use local::is_local_host;
