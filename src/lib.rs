//! pgbtop - top-like monitor for pgbouncer poolers.
//!
//! This library provides the pieces used by the `pgbtop` binary:
//! - `collector` - host CPU and load sampling, pooler log tailing
//! - `pooler` - admin console connections and command dispatch
//! - `session` - the registry of up to eight pooler sessions and bookmarks
//! - `tui` - the interactive engine and its screen

pub mod collector;
pub mod pooler;
pub mod session;
pub mod tui;
pub mod util;
