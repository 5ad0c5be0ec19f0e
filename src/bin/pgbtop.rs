//! pgbtop - top-like monitor for pgbouncer.
//!
//! Usage:
//!   pgbtop                          # bookmarked poolers, or /tmp:6432
//!   pgbtop -h 10.0.0.5 -U admin     # one pooler over TCP
//!   pgbtop -i 5 pgbouncer stats     # DBNAME and USERNAME positionally

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::{ArgAction, Parser};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use pgbtop::collector::{CpuSampler, RealFs};
use pgbtop::pooler::PgConnector;
use pgbtop::session::bookmarks;
use pgbtop::session::{
    DEFAULT_DBNAME, DEFAULT_HOST, DEFAULT_PORT, Descriptor, MAX_SESSIONS, Registry,
};
use pgbtop::tui::{App, AppConfig, CrosstermConsole};

/// Top-like monitor for pgbouncer.
#[derive(Parser)]
#[command(
    name = "pgbtop",
    version,
    about = "Top-like monitor for pgbouncer",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Args {
    /// Database name to connect to (same as -d).
    #[arg(value_name = "DBNAME")]
    dbname_pos: Option<String>,

    /// User name to connect as (same as -U).
    #[arg(value_name = "USERNAME")]
    username_pos: Option<String>,

    /// Pooler host or socket directory (default: /tmp).
    #[arg(short = 'h', long)]
    host: Option<String>,

    /// Pooler port (default: 6432).
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// User name (default: $USER).
    #[arg(short = 'U', long)]
    username: Option<String>,

    /// Admin console database (default: pgbouncer).
    #[arg(short = 'd', long)]
    dbname: Option<String>,

    /// Never prompt for a password.
    #[arg(short = 'w', long = "no-password", conflicts_with = "password")]
    no_password: bool,

    /// Ask for a password before connecting.
    #[arg(short = 'W', long)]
    password: bool,

    /// Refresh interval in seconds.
    #[arg(short = 'i', long, default_value = "1", value_parser = parse_interval)]
    interval: Duration,

    /// Bookmarks file (default: ~/.pgbrc).
    #[arg(long, value_name = "PATH")]
    rc_file: Option<PathBuf>,

    /// Write diagnostics to this file.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Print help.
    #[arg(short = '?', long, action = ArgAction::Help)]
    help: Option<bool>,

    /// Print version.
    #[arg(short = 'V', long, action = ArgAction::Version)]
    version: Option<bool>,
}

impl Args {
    /// True when the command line names a pooler, as opposed to relying
    /// on bookmarks.
    fn names_pooler(&self) -> bool {
        self.host.is_some()
            || self.port.is_some()
            || self.username.is_some()
            || self.dbname.is_some()
            || self.dbname_pos.is_some()
            || self.username_pos.is_some()
    }

    fn descriptor(&self) -> Descriptor {
        let user = self
            .username
            .clone()
            .or_else(|| self.username_pos.clone())
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "postgres".to_string());
        let dbname = self
            .dbname
            .clone()
            .or_else(|| self.dbname_pos.clone())
            .unwrap_or_else(|| DEFAULT_DBNAME.to_string());
        Descriptor::new(
            self.host.as_deref().unwrap_or(DEFAULT_HOST),
            self.port.unwrap_or(DEFAULT_PORT),
            user,
            dbname,
        )
    }
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", s))?;
    Duration::try_from_secs_f64(secs).map_err(|_| "should be positive value".to_string())
}

fn init_logging(path: &PathBuf, verbose: u8) -> io::Result<()> {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pgbtop={}", level)));
    let file = File::create(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

/// Reads a password on the terminal without echoing it.
fn read_password(prompt: &str) -> io::Result<Option<String>> {
    let mut stderr = io::stderr();
    write!(stderr, "{}", prompt)?;
    stderr.flush()?;

    enable_raw_mode()?;
    let result = read_masked();
    disable_raw_mode()?;
    writeln!(stderr)?;
    result
}

fn read_masked() -> io::Result<Option<String>> {
    let mut password = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(Some(password)),
            KeyCode::Esc => return Ok(None),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(None);
            }
            KeyCode::Backspace => {
                password.pop();
            }
            KeyCode::Char(c) => password.push(c),
            _ => {}
        }
    }
}

fn prompt_password(descriptor: &Descriptor) -> Option<String> {
    match read_password(&format!("Password for {}: ", descriptor)) {
        Ok(password) => password,
        Err(e) => {
            eprintln!("Error: failed to read password: {}", e);
            None
        }
    }
}

/// Descriptors to open at startup, in slot order.
fn startup_descriptors(args: &Args, rc_path: Option<&PathBuf>) -> Vec<Descriptor> {
    let mut descriptors = Vec::new();
    if args.names_pooler() {
        descriptors.push(args.descriptor());
    }

    if let Some(path) = rc_path
        && path.exists()
    {
        match bookmarks::read(path) {
            Ok(saved) => descriptors.extend(saved),
            Err(e) => {
                eprintln!("Warning: {}", e);
                warn!(error = %e, "bookmarks ignored");
            }
        }
    }

    if descriptors.is_empty() {
        descriptors.push(args.descriptor());
    }
    descriptors
}

fn main() {
    let args = Args::parse();

    if let Some(path) = &args.log_file
        && let Err(e) = init_logging(path, args.verbose)
    {
        eprintln!("Error: cannot open log file '{}': {}", path.display(), e);
        std::process::exit(1);
    }

    let sampler = match CpuSampler::new(RealFs::new(), "/proc") {
        Ok(sampler) => sampler,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let rc_path = args.rc_file.clone().or_else(bookmarks::default_path);
    let mut descriptors = startup_descriptors(&args, rc_path.as_ref());
    if descriptors.len() > MAX_SESSIONS {
        eprintln!(
            "Warning: only {} connections are supported, {} ignored",
            MAX_SESSIONS,
            descriptors.len() - MAX_SESSIONS
        );
        descriptors.truncate(MAX_SESSIONS);
    }

    if args.password
        && let Some(first) = descriptors.first_mut()
        && first.password.is_none()
    {
        first.password = prompt_password(first);
    }

    let connector = PgConnector::new();
    let mut registry = Registry::new();
    let no_password = args.no_password;
    let mut password_prompt = |descriptor: &Descriptor| {
        if no_password {
            None
        } else {
            prompt_password(descriptor)
        }
    };
    for descriptor in descriptors {
        if let Err(e) = registry.seed(&connector, descriptor, &mut password_prompt) {
            eprintln!("Warning: {}", e);
            warn!(error = %e, "session not seeded");
        }
    }
    info!(sessions = registry.active_count(), "startup sessions seeded");

    let config = AppConfig {
        interval: args.interval,
        rc_path,
    };
    let mut app = App::new(registry, Box::new(connector), sampler, config);

    let result = CrosstermConsole::new().and_then(|mut console| {
        let result = app.run(&mut console);
        console.restore().and(result)
    });
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
