//! Connection bootstrap for the `kv_store` container.
//!
//! # Invariants
//! - Returned connections hold a `kv_store` table and report
//!   [`CONTAINER_VERSION`] from `PRAGMA user_version`.
//! - A fresh file is stamped in the same transaction that creates the table.

use super::{DbError, DbResult, CONTAINER_VERSION};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const KV_STORE_SQL: &str = include_str!("kv_store.sql");

/// Opens (or creates) a SQLite file holding the state container.
///
/// # Side effects
/// - Creates the file when missing.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens a private in-memory container.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

/// Reads the container layout version of an open connection.
pub fn container_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn open_with<F>(mode: &str, connect: F) -> DbResult<Connection>
where
    F: FnOnce() -> rusqlite::Result<Connection>,
{
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match connect() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match prepare_container(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_container_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn prepare_container(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;

    let found = container_version(conn)?;
    if found > CONTAINER_VERSION {
        return Err(DbError::NewerContainer {
            found,
            supported: CONTAINER_VERSION,
        });
    }

    // DDL is idempotent; current containers run it too.
    let tx = conn.transaction()?;
    tx.execute_batch(KV_STORE_SQL)?;
    if found < CONTAINER_VERSION {
        tx.execute_batch(&format!("PRAGMA user_version = {CONTAINER_VERSION};"))?;
    }
    tx.commit()?;

    if found != CONTAINER_VERSION {
        info!(
            "event=db_container module=db status=stamped from={found} to={CONTAINER_VERSION}"
        );
    }
    Ok(())
}
