//! Saved connections (`~/.pgbrc`).
//!
//! One line per session: `host:port:dbname:user:password`. The file may
//! hold passwords, so it is only read when neither group nor others have
//! any permission on it. New files are created 0600, and an existing file
//! is tightened to 0600 after every write.

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Descriptor, MAX_SESSIONS};

/// File name under the home directory.
pub const BOOKMARKS_FILE: &str = ".pgbrc";

/// Group and other permission bits.
const GROUP_OTHER_MASK: u32 = 0o077;

/// Error type for bookmark file operations.
#[derive(Debug)]
pub enum BookmarkError {
    /// Reading or writing the file failed.
    Io(PathBuf, io::Error),
    /// The file is accessible by group or others.
    Permissions(PathBuf),
}

impl std::fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookmarkError::Io(path, e) => write!(f, "{}: {}", path.display(), e),
            BookmarkError::Permissions(path) => {
                write!(f, "{} has wrong permissions", path.display())
            }
        }
    }
}

impl std::error::Error for BookmarkError {}

/// `~/.pgbrc`, if a home directory is known.
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(BOOKMARKS_FILE))
}

/// Reads saved connections, at most [`MAX_SESSIONS`] of them.
///
/// Lines that do not parse are skipped with a warning.
pub fn read(path: &Path) -> Result<Vec<Descriptor>, BookmarkError> {
    let io_err = |e| BookmarkError::Io(path.to_path_buf(), e);

    let mode = fs::metadata(path).map_err(io_err)?.permissions().mode();
    if mode & GROUP_OTHER_MASK != 0 {
        return Err(BookmarkError::Permissions(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(io_err)?;
    let mut descriptors = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(desc) => descriptors.push(desc),
            None => warn!(path = %path.display(), line = lineno + 1, "skipping malformed bookmark"),
        }
    }

    if descriptors.len() > MAX_SESSIONS {
        warn!(
            count = descriptors.len(),
            max = MAX_SESSIONS,
            "too many bookmarks, extra entries ignored"
        );
        descriptors.truncate(MAX_SESSIONS);
    }
    debug!(path = %path.display(), count = descriptors.len(), "bookmarks loaded");
    Ok(descriptors)
}

/// Writes `descriptors`, replacing the file, and restricts it to the owner.
pub fn write<'a>(
    path: &Path,
    descriptors: impl IntoIterator<Item = &'a Descriptor>,
) -> Result<(), BookmarkError> {
    let io_err = |e| BookmarkError::Io(path.to_path_buf(), e);

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(io_err)?;
    for desc in descriptors {
        writeln!(file, "{}", format_line(desc)).map_err(io_err)?;
    }
    file.flush().map_err(io_err)?;
    drop(file);

    let mut perms = fs::metadata(path).map_err(io_err)?.permissions();
    if perms.mode() & GROUP_OTHER_MASK != 0 {
        perms.set_mode(0o600);
        fs::set_permissions(path, perms).map_err(io_err)?;
    }
    debug!(path = %path.display(), "bookmarks written");
    Ok(())
}

fn parse_line(line: &str) -> Option<Descriptor> {
    let mut fields = line.splitn(5, ':');
    let host = fields.next().filter(|s| !s.is_empty())?;
    let port = fields.next()?.trim().parse().ok()?;
    let dbname = fields.next().filter(|s| !s.is_empty())?;
    let user = fields.next().filter(|s| !s.is_empty())?;
    let password = fields.next().unwrap_or("");

    let mut desc = Descriptor::new(host, port, user, dbname);
    if !password.is_empty() {
        desc.password = Some(password.to_string());
    }
    Some(desc)
}

fn format_line(desc: &Descriptor) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        desc.host,
        desc.port,
        desc.dbname,
        desc.user,
        desc.password.as_deref().unwrap_or("")
    )
}
