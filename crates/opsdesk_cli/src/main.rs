//! `opsdesk` command-line entry point.
//!
//! # Responsibility
//! - Pick the store binding: embedded SQLite file or remote server.
//! - Start file logging only when a log directory is supplied.

mod args;
mod commands;

use args::Cli;
use clap::Parser;
use commands::{execute, CliError, Context};
use log::info;
use opsdesk_client::{connect, ClientConfig};
use opsdesk_core::{
    init_logging, Clock, EmbeddedStores, IncidentStore, LogTarget, RunbookStore,
    SqliteStateRepository, SystemClock,
};
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("opsdesk: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&cli.log_level, LogTarget::directory(log_dir)?)?;
    }

    let stdout = std::io::stdout();
    let mut confirm = prompt_on_stdin;

    match cli.remote.as_deref() {
        Some(base_url) => {
            let config =
                ClientConfig::new(base_url).with_timeout(Duration::from_secs(cli.timeout_secs));
            info!(
                "event=cli_start module=cli status=ok binding=remote base_url={}",
                config.base_url
            );
            let (incidents, runbooks) = connect(&config).map_err(CliError::from)?;
            dispatch(cli.command, &incidents, &runbooks, stdout.lock(), &mut confirm)?;
        }
        None => {
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let repo = SqliteStateRepository::open(&cli.db, Arc::clone(&clock))?;
            info!(
                "event=cli_start module=cli status=ok binding=embedded db_path={}",
                cli.db.display()
            );
            let stores = EmbeddedStores::new(Arc::new(repo), clock);
            dispatch(
                cli.command,
                &stores.incidents,
                &stores.runbooks,
                stdout.lock(),
                &mut confirm,
            )?;
        }
    }
    Ok(())
}

fn dispatch<W: Write>(
    command: args::Command,
    incidents: &dyn IncidentStore,
    runbooks: &dyn RunbookStore,
    out: W,
    confirm: &mut dyn FnMut(&str) -> bool,
) -> Result<(), CliError> {
    let mut ctx = Context {
        incidents,
        runbooks,
        out,
        confirm,
    };
    execute(command, &mut ctx)
}

fn prompt_on_stdin(question: &str) -> bool {
    eprint!("{question} [y/N] ");
    let _ = std::io::stderr().flush();

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
