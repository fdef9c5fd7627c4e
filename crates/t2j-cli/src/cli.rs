//! Command-line argument definitions.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Toggl to JIRA work log synchronizer.
///
/// Fetches Toggl time entries tagged for the issue tracker and posts the
/// ones not yet present as JIRA work-logs.
#[derive(Debug, Parser)]
#[command(name = "t2j", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one sync pass and print what happened.
    Sync {
        /// Fetch entries starting this many days back (0 = no window).
        #[arg(long, default_value_t = 0)]
        days_back: u32,
    },

    /// Serve the HTTP endpoint that triggers syncs remotely.
    Serve {
        /// Override the configured bind address.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}
