//! Query and command dispatch against a pooler link.
//!
//! Every admin-console interaction the UI performs goes through here:
//! the periodic `show` query for the selected context, one-shot admin
//! commands, config lookups and the counters of the summary pane.

use tracing::{debug, info, warn};

use super::{Link, LinkError, Reply, ResultSet};

/// Confirmation text required before a shutdown is sent.
pub const SHUTDOWN_CONFIRMATION: &str = "YES";

/// Which admin view the answer pane shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryContext {
    #[default]
    Pools,
    Clients,
    Servers,
    Databases,
    Stats,
    Config,
}

impl QueryContext {
    /// Admin-console command issued for this context.
    pub fn command(self) -> &'static str {
        match self {
            QueryContext::Pools => "show pools",
            QueryContext::Clients => "show clients",
            QueryContext::Servers => "show servers",
            QueryContext::Databases => "show databases",
            QueryContext::Stats => "show stats",
            QueryContext::Config => "show config",
        }
    }

    /// Human-readable name used in status messages.
    pub fn label(self) -> &'static str {
        match self {
            QueryContext::Pools => "pools",
            QueryContext::Clients => "clients",
            QueryContext::Servers => "servers",
            QueryContext::Databases => "databases",
            QueryContext::Stats => "stats",
            QueryContext::Config => "config",
        }
    }
}

/// Error type for dispatch operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The query failed or returned no table.
    QueryFailed,
    /// Refused before anything was sent to the server.
    Rejected(String),
    /// `show config` has no (non-empty) value for this key.
    ConfigNotFound(String),
    /// The server answered the command with an error.
    CommandFailed(String),
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::QueryFailed => write!(f, "no data"),
            DispatchError::Rejected(msg) => write!(f, "{}", msg),
            DispatchError::ConfigNotFound(name) => write!(f, "config option '{}' not found", name),
            DispatchError::CommandFailed(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Runs the `show` command for `context` and returns its table.
///
/// Any failure, including a non-tabular reply, collapses to
/// [`DispatchError::QueryFailed`]: the caller keeps whatever it showed last.
pub fn query(link: &mut dyn Link, context: QueryContext) -> Result<ResultSet, DispatchError> {
    match link.execute(context.command()) {
        Ok(Reply::Rows(rs)) => Ok(rs),
        Ok(Reply::Command) => {
            debug!(command = context.command(), "reply carried no rows");
            Err(DispatchError::QueryFailed)
        }
        Err(e) => {
            debug!(command = context.command(), error = %e, "query failed");
            Err(DispatchError::QueryFailed)
        }
    }
}

/// One-shot administrative commands.
///
/// Targets hold the raw prompt input; an empty target means "all
/// databases" where the command allows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Reload,
    Suspend,
    Pause(String),
    Resume(String),
    Kill(String),
    /// Carries the confirmation text typed by the user.
    Shutdown(String),
}

impl AdminCommand {
    /// Command text to send, or the reason it must not be sent.
    pub fn text(&self) -> Result<String, DispatchError> {
        match self {
            AdminCommand::Reload => Ok("RELOAD".to_string()),
            AdminCommand::Suspend => Ok("SUSPEND".to_string()),
            AdminCommand::Pause(db) => Ok(with_target("PAUSE", db)),
            AdminCommand::Resume(db) => Ok(with_target("RESUME", db)),
            AdminCommand::Kill(db) => {
                if db.trim().is_empty() {
                    Err(DispatchError::Rejected("A database is required.".to_string()))
                } else {
                    Ok(with_target("KILL", db))
                }
            }
            AdminCommand::Shutdown(confirm) => {
                if confirm.trim() == SHUTDOWN_CONFIRMATION {
                    Ok("SHUTDOWN".to_string())
                } else {
                    Err(DispatchError::Rejected(
                        "Cancel shutdown. Not confirmed.".to_string(),
                    ))
                }
            }
        }
    }

    /// Status line shown after the server accepted the command.
    pub fn success_message(&self) -> String {
        match self {
            AdminCommand::Reload => "Reload current pgbouncer: success.".to_string(),
            AdminCommand::Suspend => "Suspend current pgbouncer: success.".to_string(),
            AdminCommand::Pause(db) if db.trim().is_empty() => "All pools paused.".to_string(),
            AdminCommand::Pause(db) => format!("Pause pool {}: success.", db.trim()),
            AdminCommand::Resume(db) if db.trim().is_empty() => "All pools resumed.".to_string(),
            AdminCommand::Resume(db) => format!("Resume pool {}: success.", db.trim()),
            AdminCommand::Kill(db) => format!("Kill database {}: success.", db.trim()),
            AdminCommand::Shutdown(_) => "Pgbouncer shutdown: success.".to_string(),
        }
    }

    /// Status line shown when the server rejected the command.
    pub fn failure_message(&self, server_text: &str) -> String {
        match self {
            AdminCommand::Reload => format!("Reload current pgbouncer: {}", server_text),
            AdminCommand::Suspend => format!("Suspend current pgbouncer: {}", server_text),
            AdminCommand::Pause(db) if db.trim().is_empty() => {
                format!("Pause pool: {}", server_text)
            }
            AdminCommand::Pause(db) => format!("Pause pool {}: {}", db.trim(), server_text),
            AdminCommand::Resume(db) if db.trim().is_empty() => {
                format!("Resume pool: {}", server_text)
            }
            AdminCommand::Resume(db) => format!("Resume pool {}: {}", db.trim(), server_text),
            AdminCommand::Kill(db) => format!("Kill database {}: {}", db.trim(), server_text),
            AdminCommand::Shutdown(_) => format!("Pgbouncer shutdown failed with: {}", server_text),
        }
    }
}

fn with_target(verb: &str, target: &str) -> String {
    let target = target.trim();
    if target.is_empty() {
        verb.to_string()
    } else {
        format!("{} {}", verb, target)
    }
}

/// Sends an admin command. Local rejections never reach the link.
pub fn run_admin(link: &mut dyn Link, command: &AdminCommand) -> Result<(), DispatchError> {
    let text = command.text()?;
    match link.execute(&text) {
        Ok(_) => {
            info!(command = %text, "admin command succeeded");
            Ok(())
        }
        Err(e) => {
            warn!(command = %text, error = %e, "admin command failed");
            Err(DispatchError::CommandFailed(server_text(e)))
        }
    }
}

fn server_text(e: LinkError) -> String {
    match e {
        LinkError::Command(msg) | LinkError::Connect(msg) => msg,
        other => other.to_string(),
    }
}

/// Value of the `show config` row named `name`.
pub fn config_value(link: &mut dyn Link, name: &str) -> Result<String, DispatchError> {
    let not_found = || DispatchError::ConfigNotFound(name.to_string());
    let config = query(link, QueryContext::Config).map_err(|_| not_found())?;
    match config.lookup(name, 1) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(not_found()),
    }
}

/// Object counts shown on the summary pane's pgbouncer line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolerSummary {
    pub pools: Option<usize>,
    pub databases: Option<usize>,
    pub clients: Option<usize>,
    pub servers: Option<usize>,
}

/// Counts rows of the four list views. A failed view counts as unknown.
pub fn summary(link: &mut dyn Link) -> PoolerSummary {
    let mut count = |context| query(&mut *link, context).ok().map(|rs| rs.row_count());
    PoolerSummary {
        pools: count(QueryContext::Pools),
        databases: count(QueryContext::Databases),
        clients: count(QueryContext::Clients),
        servers: count(QueryContext::Servers),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pooler::mock::MockPooler;

    fn table(columns: &[&str], rows: &[&[&str]]) -> ResultSet {
        ResultSet::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_each_context_issues_its_command() {
        let pooler = MockPooler::new();
        let mut link = pooler.link();
        for context in [
            QueryContext::Pools,
            QueryContext::Clients,
            QueryContext::Servers,
            QueryContext::Databases,
            QueryContext::Stats,
            QueryContext::Config,
        ] {
            let _ = query(link.as_mut(), context);
        }
        assert_eq!(
            pooler.sent(),
            vec![
                "show pools",
                "show clients",
                "show servers",
                "show databases",
                "show stats",
                "show config",
            ]
        );
    }

    #[test]
    fn test_query_returns_table() {
        let pooler = MockPooler::new();
        pooler.respond(
            "show pools",
            Reply::Rows(table(&["database", "user"], &[&["app", "app"]])),
        );
        let mut link = pooler.link();
        let rs = query(link.as_mut(), QueryContext::Pools).unwrap();
        assert_eq!(rs.row_count(), 1);
        assert_eq!(rs.columns, vec!["database", "user"]);
    }

    #[test]
    fn test_query_failure_and_command_reply_are_no_data() {
        let pooler = MockPooler::new();
        pooler.fail("show clients", "ERROR: not allowed");
        pooler.respond("show servers", Reply::Command);
        let mut link = pooler.link();
        assert_eq!(
            query(link.as_mut(), QueryContext::Clients),
            Err(DispatchError::QueryFailed)
        );
        assert_eq!(
            query(link.as_mut(), QueryContext::Servers),
            Err(DispatchError::QueryFailed)
        );
    }

    #[test]
    fn test_admin_texts() {
        assert_eq!(AdminCommand::Reload.text().unwrap(), "RELOAD");
        assert_eq!(AdminCommand::Suspend.text().unwrap(), "SUSPEND");
        assert_eq!(AdminCommand::Pause(String::new()).text().unwrap(), "PAUSE");
        assert_eq!(AdminCommand::Pause(" app ".into()).text().unwrap(), "PAUSE app");
        assert_eq!(AdminCommand::Resume(String::new()).text().unwrap(), "RESUME");
        assert_eq!(AdminCommand::Resume("app".into()).text().unwrap(), "RESUME app");
        assert_eq!(AdminCommand::Kill("app".into()).text().unwrap(), "KILL app");
        assert_eq!(AdminCommand::Shutdown("YES".into()).text().unwrap(), "SHUTDOWN");
    }

    #[test]
    fn test_kill_without_target_sends_nothing() {
        let pooler = MockPooler::new();
        let mut link = pooler.link();
        let err = run_admin(link.as_mut(), &AdminCommand::Kill("  ".into())).unwrap_err();
        assert_eq!(err, DispatchError::Rejected("A database is required.".into()));
        assert!(pooler.sent().is_empty());
    }

    #[test]
    fn test_shutdown_without_confirmation_sends_nothing() {
        let pooler = MockPooler::new();
        let mut link = pooler.link();
        for answer in ["", "yes", "Y", "NO"] {
            let err = run_admin(link.as_mut(), &AdminCommand::Shutdown(answer.into())).unwrap_err();
            assert!(matches!(err, DispatchError::Rejected(_)));
        }
        assert!(pooler.sent().is_empty());

        pooler.respond("SHUTDOWN", Reply::Command);
        run_admin(link.as_mut(), &AdminCommand::Shutdown("YES".into())).unwrap();
        assert_eq!(pooler.sent(), vec!["SHUTDOWN"]);
    }

    #[test]
    fn test_admin_failure_carries_server_text() {
        let pooler = MockPooler::new();
        pooler.fail("PAUSE app", "ERROR: no such database: app");
        let mut link = pooler.link();
        let err = run_admin(link.as_mut(), &AdminCommand::Pause("app".into())).unwrap_err();
        assert_eq!(
            err,
            DispatchError::CommandFailed("ERROR: no such database: app".into())
        );
        assert_eq!(
            AdminCommand::Pause("app".into()).failure_message("ERROR: no such database: app"),
            "Pause pool app: ERROR: no such database: app"
        );
    }

    #[test]
    fn test_config_value() {
        let pooler = MockPooler::new();
        pooler.respond(
            "show config",
            Reply::Rows(table(
                &["key", "value", "changeable"],
                &[
                    &["logfile", "/var/log/pgbouncer.log", "yes"],
                    &["conffile", "/etc/pgbouncer.ini", "yes"],
                    &["pidfile", "", "no"],
                ],
            )),
        );
        let mut link = pooler.link();
        assert_eq!(
            config_value(link.as_mut(), "logfile").unwrap(),
            "/var/log/pgbouncer.log"
        );
        assert_eq!(
            config_value(link.as_mut(), "pidfile"),
            Err(DispatchError::ConfigNotFound("pidfile".into()))
        );
        assert_eq!(
            config_value(link.as_mut(), "unix_socket_dir"),
            Err(DispatchError::ConfigNotFound("unix_socket_dir".into()))
        );
    }

    #[test]
    fn test_summary_counts() {
        let pooler = MockPooler::new();
        pooler.respond("show pools", Reply::Rows(table(&["database"], &[&["a"], &["b"]])));
        pooler.respond("show databases", Reply::Rows(table(&["name"], &[&["a"]])));
        pooler.respond("show clients", Reply::Rows(table(&["type"], &[])));
        pooler.fail("show servers", "ERROR: boom");
        let mut link = pooler.link();
        let summary = summary(link.as_mut());
        assert_eq!(summary.pools, Some(2));
        assert_eq!(summary.databases, Some(1));
        assert_eq!(summary.clients, Some(0));
        assert_eq!(summary.servers, None);
    }
}
