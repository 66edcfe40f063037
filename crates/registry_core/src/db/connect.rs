//! Per-operation connection factory for SQLite.
//!
//! # Responsibility
//! - Open a fresh SQLite connection for every adapter operation.
//! - Configure connection settings required by concurrent callers.
//!
//! # Invariants
//! - No connection outlives the operation that requested it.
//! - Returned connections are in autocommit mode with a busy timeout set.

use super::config::StoreConfig;
use super::DbResult;
use log::{debug, error};
use rusqlite::{Connection, OpenFlags};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Acquisition seam used by the registry adapter.
///
/// A pooling implementation can sit behind this trait without changing the
/// adapter contract; the adapter only requires an owned connection per call.
pub trait ConnectionFactory: Send + Sync {
    fn connect(&self) -> DbResult<Connection>;
}

/// Opens SQLite connections directly from a validated [`StoreConfig`].
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    config: StoreConfig,
}

impl SqliteConnector {
    /// Validates `config` and returns a connector for it.
    pub fn new(config: StoreConfig) -> DbResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

impl ConnectionFactory for SqliteConnector {
    /// # Side effects
    /// - Creates the database file when it does not exist yet.
    /// - Emits `db_connect` logging events with duration and status.
    fn connect(&self) -> DbResult<Connection> {
        let started_at = Instant::now();
        let auth = self.config.auth_label();

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = match Connection::open_with_flags(self.config.database_location(), flags) {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=db_connect module=db status=error auth={} duration_ms={} error_code=db_open_failed error={}",
                    auth,
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        if let Err(err) = conn.busy_timeout(BUSY_TIMEOUT) {
            error!(
                "event=db_connect module=db status=error auth={} duration_ms={} error_code=db_configure_failed error={}",
                auth,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        debug!(
            "event=db_connect module=db status=ok auth={} duration_ms={}",
            auth,
            started_at.elapsed().as_millis()
        );
        Ok(conn)
    }
}
