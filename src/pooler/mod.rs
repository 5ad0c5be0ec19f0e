//! Connections to pgbouncer admin consoles.
//!
//! The engine only talks to a pooler through two seams:
//! - [`Connector`] opens a [`Link`] for a session descriptor,
//! - [`Link`] sends one command text and returns either a table or a
//!   command status.
//!
//! The production implementation lives in [`pg`]; [`mock`] provides a
//! scripted pooler for tests.

pub mod dispatch;
pub mod mock;
pub mod pg;

use crate::session::Descriptor;

pub use dispatch::{AdminCommand, DispatchError, PoolerSummary, QueryContext};
pub use pg::PgConnector;

/// Padding added to every column width when rendering a result set.
pub const COLUMN_PADDING: usize = 3;

/// Error type for pooler links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The server asked for a password and none was supplied.
    NeedsPassword,
    /// Connection could not be established.
    Connect(String),
    /// Command was rejected or failed on the server.
    Command(String),
    /// The link has no live connection.
    Closed,
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::NeedsPassword => write!(f, "password required"),
            LinkError::Connect(msg) => write!(f, "unable to connect: {}", msg),
            LinkError::Command(msg) => write!(f, "{}", msg),
            LinkError::Closed => write!(f, "connection is closed"),
        }
    }
}

impl std::error::Error for LinkError {}

/// Health of a link as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Ok,
    Bad,
}

/// Tabular reply: column names plus rows of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Display width of every column: the longest of header and cells,
    /// plus [`COLUMN_PADDING`].
    pub fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let cells = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);
                name.chars().count().max(cells) + COLUMN_PADDING
            })
            .collect()
    }

    /// Value of `column` in the first row whose first cell equals `key`.
    pub fn lookup(&self, key: &str, column: usize) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.first().is_some_and(|k| k == key))
            .and_then(|row| row.get(column))
            .map(String::as_str)
    }
}

/// What the server sent back for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A row description followed by zero or more rows.
    Rows(ResultSet),
    /// A bare command completion (RELOAD, PAUSE, ...).
    Command,
}

/// One live admin-console connection.
pub trait Link {
    /// Sends `command` verbatim using the simple query protocol.
    fn execute(&mut self, command: &str) -> Result<Reply, LinkError>;

    /// Reports whether the underlying connection is still usable.
    fn status(&self) -> LinkStatus;

    /// Drops the current connection and re-establishes it from the stored
    /// connection string.
    fn reset(&mut self) -> Result<(), LinkError>;
}

/// Opens links for session descriptors.
pub trait Connector {
    fn connect(&self, descriptor: &Descriptor) -> Result<Box<dyn Link>, LinkError>;
}
