//! Connection parameters for one monitored pooler.

use std::fmt;

/// Default pgbouncer admin-console port.
pub const DEFAULT_PORT: u16 = 6432;
/// Default host: the Unix socket directory pgbouncer listens in.
pub const DEFAULT_HOST: &str = "/tmp";
/// The admin console is the virtual `pgbouncer` database.
pub const DEFAULT_DBNAME: &str = "pgbouncer";

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub dbname: String,
    pub password: Option<String>,
}

impl Descriptor {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            dbname: dbname.into(),
            password: None,
        }
    }

    /// libpq-style connection string.
    pub fn conninfo(&self) -> String {
        let mut conninfo = format!(
            "host={} port={} user={} dbname={}",
            quote(&self.host),
            self.port,
            quote(&self.user),
            quote(&self.dbname)
        );
        if let Some(password) = &self.password {
            conninfo.push_str(" password=");
            conninfo.push_str(&quote(password));
        }
        conninfo
    }

    /// Parses the add-connection prompt: `host port username dbname`.
    pub fn from_prompt(input: &str) -> Result<Self, String> {
        let fields: Vec<&str> = input.split_whitespace().collect();
        let [host, port, user, dbname] = fields.as_slice() else {
            return Err(format!(
                "Expected \"host port username dbname\", got {} field(s).",
                fields.len()
            ));
        };
        let port = port
            .parse()
            .map_err(|_| format!("Invalid port '{}'.", port))?;
        Ok(Self::new(*host, port, *user, *dbname))
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}@{}", self.host, self.port, self.user, self.dbname)
    }
}

/// Quotes a connection-string value when it contains spaces, quotes or
/// backslashes, or is empty.
fn quote(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conninfo_without_password() {
        let desc = Descriptor::new("/tmp", 6432, "postgres", "pgbouncer");
        assert_eq!(
            desc.conninfo(),
            "host=/tmp port=6432 user=postgres dbname=pgbouncer"
        );
    }

    #[test]
    fn test_conninfo_with_password() {
        let mut desc = Descriptor::new("10.0.0.5", 6000, "admin", "pgbouncer");
        desc.password = Some("s3cret".into());
        assert_eq!(
            desc.conninfo(),
            "host=10.0.0.5 port=6000 user=admin dbname=pgbouncer password=s3cret"
        );
    }

    #[test]
    fn test_conninfo_quotes_odd_values() {
        let mut desc = Descriptor::new("db", 6432, "admin", "pgbouncer");
        desc.password = Some("it's a pass".into());
        assert!(desc.conninfo().ends_with(r"password='it\'s a pass'"));
    }

    #[test]
    fn test_from_prompt() {
        let desc = Descriptor::from_prompt("  127.0.0.1 6432  admin pgbouncer ").unwrap();
        assert_eq!(desc, Descriptor::new("127.0.0.1", 6432, "admin", "pgbouncer"));
        assert!(Descriptor::from_prompt("127.0.0.1 6432").is_err());
        assert!(Descriptor::from_prompt("host notaport user db").is_err());
        assert!(Descriptor::from_prompt("a 1 b c d").is_err());
    }

    #[test]
    fn test_display() {
        let desc = Descriptor::new("/tmp", 6432, "postgres", "pgbouncer");
        assert_eq!(desc.to_string(), "/tmp:6432 postgres@pgbouncer");
    }
}
