use clap::{Args, Parser, Subcommand};
use opsdesk_core::{default_log_level, IncidentStatus, Severity};
use std::path::PathBuf;
use uuid::Uuid;

/// Command-line arguments for `opsdesk`.
#[derive(Debug, Parser)]
#[command(
    name = "opsdesk",
    about = "Track incidents and runbooks locally or against an OpsDesk server",
    version
)]
pub struct Cli {
    /// SQLite file for the embedded store
    #[arg(long, env = "OPSDESK_DB_PATH", default_value = "opsdesk.sqlite3")]
    pub db: PathBuf,

    /// Server origin; when set, the embedded store is not used
    #[arg(long, env = "OPSDESK_BASE_URL", value_name = "URL")]
    pub remote: Option<String>,

    /// Remote request timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,

    /// Absolute directory for log files; logging is off when unset
    #[arg(long, env = "OPSDESK_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Log level used with --log-dir; debug builds default to debug
    #[arg(long, env = "OPSDESK_LOG_LEVEL", default_value = default_log_level())]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage incidents
    #[command(subcommand)]
    Incidents(IncidentCommand),
    /// Manage runbooks
    #[command(subcommand)]
    Runbooks(RunbookCommand),
}

#[derive(Debug, Subcommand)]
pub enum IncidentCommand {
    /// List incidents, newest first
    List(IncidentListArgs),
    /// Show one incident
    Show { id: Uuid },
    /// Open a new incident
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        service: String,
        #[arg(long)]
        severity: Severity,
        #[arg(long, default_value = "Open")]
        status: IncidentStatus,
    },
    /// Change supplied fields of an incident
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        severity: Option<Severity>,
        #[arg(long)]
        status: Option<IncidentStatus>,
    },
    /// Append a note
    Note {
        id: Uuid,
        #[arg(long)]
        author: String,
        #[arg(long)]
        text: String,
    },
    Close { id: Uuid },
    Reopen { id: Uuid },
    /// Flip Open/Closed
    Toggle { id: Uuid },
    /// Delete after confirmation
    Delete {
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Default, Args)]
pub struct IncidentListArgs {
    /// Case-insensitive match on title or service
    #[arg(short, long)]
    pub q: Option<String>,
    /// Open, Closed or All
    #[arg(long)]
    pub status: Option<String>,
    /// P1..P4 or All
    #[arg(long)]
    pub severity: Option<String>,
    /// Exact service name
    #[arg(long)]
    pub service: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum RunbookCommand {
    /// List runbooks, most recently updated first
    List {
        /// Case-insensitive match on title or any tag
        #[arg(short, long)]
        q: Option<String>,
        /// Exact tag
        #[arg(long)]
        tag: Option<String>,
    },
    Show { id: Uuid },
    Create {
        #[arg(long)]
        title: String,
        /// Comma-separated, e.g. "database, failover"
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long)]
        content: String,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        /// Replaces all tags; pass "" to clear
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    Delete {
        id: Uuid,
        #[arg(long)]
        yes: bool,
    },
}
