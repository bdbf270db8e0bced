use log::{error, info};
use opsdesk_core::{init_logging, Clock, EmbeddedStores, SqliteStateRepository, SystemClock};
use opsdesk_server::{serve, ApiState, ServerConfig};
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=server_exit module=server status=error error={err}");
            eprintln!("opsdesk-server: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::from_env()?;
    init_logging(&config.log_level, config.log_target.clone())?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repo = SqliteStateRepository::open(&config.db_path, Arc::clone(&clock))?;
    info!(
        "event=server_config module=server status=ok db_path={} bind={}",
        config.db_path.display(),
        config.bind
    );

    let state = ApiState::embedded(EmbeddedStores::new(Arc::new(repo), clock));
    let listener = TcpListener::bind(config.bind).await?;
    serve(listener, state, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=signal_listen module=server status=error error={err}");
        std::future::pending::<()>().await;
    }
}
