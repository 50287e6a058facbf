//! Opening and preparing inventory connections.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout.
//! - Returned connections are at the latest schema version.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) an inventory database file.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    prepare("file", Connection::open(path))
}

/// Opens a throwaway in-memory inventory database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    prepare("memory", Connection::open_in_memory())
}

fn prepare(mode: &'static str, opened: rusqlite::Result<Connection>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result: DbResult<(Connection, usize)> = opened.map_err(DbError::from).and_then(
        |mut conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            let applied = apply_migrations(&mut conn)?;
            Ok((conn, applied))
        },
    );

    match result {
        Ok((conn, applied)) => {
            info!(
                "event=db_open module=db status=ok mode={} steps_applied={} duration_ms={}",
                mode,
                applied,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}
