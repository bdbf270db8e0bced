//! HTTP server exposing the OpsDesk record stores.
//!
//! Routes live under [`api::API_PREFIX`]; `GET /healthz` sits at the root.

pub mod api;
pub mod config;
pub mod error;

pub use api::{router, ApiState, API_PREFIX};
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;

use log::info;
use std::future::Future;
use tokio::net::TcpListener;

/// Serves `state` on an already bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: ApiState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!("event=server_start module=server status=ok addr={addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("event=server_stop module=server status=ok addr={addr}");
    Ok(())
}
