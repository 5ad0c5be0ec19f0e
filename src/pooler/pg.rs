//! `postgres`-backed links to pgbouncer admin consoles.
//!
//! The admin console only understands the simple query protocol, so every
//! command goes through `Client::simple_query`.

use postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::debug;

use super::{Connector, Link, LinkError, LinkStatus, Reply, ResultSet};
use crate::session::Descriptor;

/// Connects to poolers over TCP or a Unix socket directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgConnector;

impl PgConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for PgConnector {
    fn connect(&self, descriptor: &Descriptor) -> Result<Box<dyn Link>, LinkError> {
        let conninfo = descriptor.conninfo();
        let client = open(&conninfo)?;
        debug!(pooler = %descriptor, "connected");
        Ok(Box::new(PgLink {
            conninfo,
            client: Some(client),
        }))
    }
}

/// A single admin-console connection.
pub struct PgLink {
    conninfo: String,
    client: Option<Client>,
}

impl Link for PgLink {
    fn execute(&mut self, command: &str) -> Result<Reply, LinkError> {
        let client = self.client.as_mut().ok_or(LinkError::Closed)?;
        let messages = client
            .simple_query(command)
            .map_err(|e| LinkError::Command(format_postgres_error(&e)))?;
        Ok(collect_reply(messages))
    }

    fn status(&self) -> LinkStatus {
        match &self.client {
            Some(client) if !client.is_closed() => LinkStatus::Ok,
            _ => LinkStatus::Bad,
        }
    }

    fn reset(&mut self) -> Result<(), LinkError> {
        self.client = None;
        self.client = Some(open(&self.conninfo)?);
        debug!("connection re-established");
        Ok(())
    }
}

fn open(conninfo: &str) -> Result<Client, LinkError> {
    Client::connect(conninfo, NoTls).map_err(|e| {
        if needs_password(&e) {
            LinkError::NeedsPassword
        } else {
            LinkError::Connect(format_postgres_error(&e))
        }
    })
}

/// Folds a simple-query message stream into a table or a command status.
fn collect_reply(messages: Vec<SimpleQueryMessage>) -> Reply {
    let mut columns: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(cols) => {
                columns = Some(cols.iter().map(|c| c.name().to_string()).collect());
            }
            SimpleQueryMessage::Row(row) => {
                if columns.is_none() {
                    columns = Some(row.columns().iter().map(|c| c.name().to_string()).collect());
                }
                rows.push(
                    (0..row.len())
                        .map(|i| row.get(i).unwrap_or("").to_string())
                        .collect(),
                );
            }
            _ => {}
        }
    }

    match columns {
        Some(columns) => Reply::Rows(ResultSet::new(columns, rows)),
        None => Reply::Command,
    }
}

/// The client refuses to continue when the server requests a password and
/// none is configured; that is the only case worth prompting for.
fn needs_password(e: &postgres::Error) -> bool {
    e.as_db_error().is_none() && e.to_string().contains("password missing")
}

/// Formats PostgreSQL error message for display.
pub(crate) fn format_postgres_error(e: &postgres::Error) -> String {
    if let Some(db_error) = e.as_db_error() {
        format!("{}: {}", db_error.severity(), db_error.message())
    } else {
        let msg = e.to_string();
        if msg.contains("Connection refused") {
            "connection refused".to_string()
        } else if msg.contains("password authentication failed") {
            "password authentication failed".to_string()
        } else if msg.contains("No such file or directory") {
            "no such socket".to_string()
        } else {
            msg
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_reply_without_rows() {
        assert_eq!(collect_reply(Vec::new()), Reply::Command);
    }

    #[test]
    fn test_closed_link_reports_bad() {
        let mut link = PgLink {
            conninfo: "host=/nonexistent-socket-dir port=1 user=x dbname=pgbouncer".into(),
            client: None,
        };
        assert_eq!(link.status(), LinkStatus::Bad);
        assert_eq!(link.execute("show pools"), Err(LinkError::Closed));
    }
}
