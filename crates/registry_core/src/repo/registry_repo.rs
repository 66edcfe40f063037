//! Voter registry port and SQLite adapter.
//!
//! # Responsibility
//! - Define the `RegistryRepositoryPort` capability set used by callers.
//! - Translate each port operation into statements against `voters`.
//!
//! # Invariants
//! - Every operation acquires its own connection and drops it on return.
//! - All statements bind values as parameters; no SQL is built from input.
//! - `save` inserts inside a transaction and never upserts.
//! - Storage errors reach the caller unchanged inside `RepoError::Db`.

use crate::db::{ConnectionFactory, DbError, DbResult, SqliteConnector, StoreConfig};
use crate::model::record::{RegistryRecord, VoterId};
use log::{debug, error, info, warn};
use rusqlite::{params, ErrorCode, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const CREATE_VOTERS_SQL: &str = "CREATE TABLE IF NOT EXISTS voters(
    id INTEGER PRIMARY KEY,
    name VARCHAR(100) NOT NULL CHECK (length(name) <= 100),
    age INTEGER NOT NULL,
    is_alive BOOLEAN NOT NULL
);";

const EXISTS_VOTER_SQL: &str = "SELECT 1 FROM voters WHERE id = ?1;";

const INSERT_VOTER_SQL: &str = "INSERT INTO voters(id, name, age, is_alive)
VALUES (?1, ?2, ?3, ?4);";

const SELECT_VOTER_SQL: &str = "SELECT
    id,
    name,
    age,
    is_alive
FROM voters
WHERE id = ?1;";

const DELETE_VOTERS_SQL: &str = "DELETE FROM voters;";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by every registry port operation.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl RepoError {
    /// Returns the underlying SQLite error, if this failure came from the store.
    pub fn sqlite_error(&self) -> Option<&rusqlite::Error> {
        match self {
            Self::Db(DbError::Sqlite(err)) => Some(err),
            Self::Db(DbError::InvalidConfig(_)) | Self::InvalidData(_) => None,
        }
    }

    /// True when the store rejected a write through a constraint, such as a
    /// duplicate primary key.
    pub fn is_constraint_violation(&self) -> bool {
        self.sqlite_error()
            .and_then(rusqlite::Error::sqlite_error_code)
            == Some(ErrorCode::ConstraintViolation)
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted voter data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Capability set callers program against.
pub trait RegistryRepositoryPort {
    /// Creates the `voters` table when absent. Safe to call repeatedly.
    fn init_schema(&self) -> RepoResult<()>;
    /// Returns whether a voter with `id` is stored.
    fn exists_by_id(&self, id: VoterId) -> RepoResult<bool>;
    /// Inserts exactly one voter. A duplicate `id` fails with the store's
    /// constraint error; nothing is overwritten.
    fn save(&self, id: VoterId, name: &str, age: i32, is_alive: bool) -> RepoResult<()>;
    /// Loads one voter; `Ok(None)` when absent.
    fn find_by_id(&self, id: VoterId) -> RepoResult<Option<RegistryRecord>>;
    /// Removes every stored voter.
    fn delete_all(&self) -> RepoResult<()>;

    /// Inserts `record` through [`RegistryRepositoryPort::save`].
    fn save_record(&self, record: &RegistryRecord) -> RepoResult<()> {
        self.save(
            record.id(),
            record.name(),
            record.age(),
            record.is_alive(),
        )
    }
}

impl<T: RegistryRepositoryPort + ?Sized> RegistryRepositoryPort for &T {
    fn init_schema(&self) -> RepoResult<()> {
        (**self).init_schema()
    }

    fn exists_by_id(&self, id: VoterId) -> RepoResult<bool> {
        (**self).exists_by_id(id)
    }

    fn save(&self, id: VoterId, name: &str, age: i32, is_alive: bool) -> RepoResult<()> {
        (**self).save(id, name, age, is_alive)
    }

    fn find_by_id(&self, id: VoterId) -> RepoResult<Option<RegistryRecord>> {
        (**self).find_by_id(id)
    }

    fn delete_all(&self) -> RepoResult<()> {
        (**self).delete_all()
    }
}

/// SQLite-backed registry adapter.
///
/// Holds only its connection factory, so one instance can be shared by
/// reference across threads; each call opens its own connection.
#[derive(Debug, Clone)]
pub struct SqliteRegistryStore<C = SqliteConnector> {
    connector: C,
}

impl SqliteRegistryStore<SqliteConnector> {
    /// Builds an adapter from either configuration shape.
    pub fn new(config: StoreConfig) -> DbResult<Self> {
        Ok(Self::with_connector(SqliteConnector::new(config)?))
    }

    /// Address-only shorthand for [`StoreConfig::anonymous`].
    pub fn open(address: impl Into<String>) -> DbResult<Self> {
        Self::new(StoreConfig::anonymous(address))
    }
}

impl<C: ConnectionFactory> SqliteRegistryStore<C> {
    pub fn with_connector(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

impl<C: ConnectionFactory> RegistryRepositoryPort for SqliteRegistryStore<C> {
    fn init_schema(&self) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .connector
            .connect()
            .map_err(RepoError::from)
            .and_then(|conn| {
                conn.execute_batch(CREATE_VOTERS_SQL)
                    .map_err(RepoError::from)
            });

        match &result {
            Ok(()) => info!(
                "event=schema_init module=repo status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=schema_init module=repo status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn exists_by_id(&self, id: VoterId) -> RepoResult<bool> {
        let started_at = Instant::now();
        let found = self
            .query_exists(id)
            .inspect_err(|err| log_failure("voter_exists", Some(id), started_at, err))?;

        debug!("event=voter_exists module=repo status=ok id={id} found={found}");
        Ok(found)
    }

    fn save(&self, id: VoterId, name: &str, age: i32, is_alive: bool) -> RepoResult<()> {
        let started_at = Instant::now();
        let mut conn = self
            .connector
            .connect()
            .map_err(RepoError::from)
            .inspect_err(|err| log_failure("voter_save", Some(id), started_at, err))?;
        // Dropping `tx` without commit rolls back and returns the connection
        // to autocommit mode.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepoError::from)
            .inspect_err(|err| log_failure("voter_save", Some(id), started_at, err))?;

        if let Err(err) = tx.execute(INSERT_VOTER_SQL, params![id, name, age, is_alive]) {
            if let Err(rollback_err) = tx.rollback() {
                error!(
                    "event=voter_save module=repo status=error id={id} error_code=rollback_failed error={rollback_err}"
                );
            }
            warn!(
                "event=voter_save module=repo status=rolled_back id={} duration_ms={} error={}",
                id,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        if let Err(err) = tx.commit() {
            error!(
                "event=voter_save module=repo status=error id={} duration_ms={} error_code=commit_failed error={}",
                id,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        info!(
            "event=voter_save module=repo status=ok id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn find_by_id(&self, id: VoterId) -> RepoResult<Option<RegistryRecord>> {
        let started_at = Instant::now();
        let record = self
            .query_voter(id)
            .inspect_err(|err| log_failure("voter_find", Some(id), started_at, err))?;

        debug!(
            "event=voter_find module=repo status=ok id={} found={}",
            id,
            record.is_some()
        );
        Ok(record)
    }

    fn delete_all(&self) -> RepoResult<()> {
        let started_at = Instant::now();
        let removed = self
            .delete_voters()
            .inspect_err(|err| log_failure("voters_delete_all", None, started_at, err))?;

        info!(
            "event=voters_delete_all module=repo status=ok removed={} duration_ms={}",
            removed,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

impl<C: ConnectionFactory> SqliteRegistryStore<C> {
    fn query_exists(&self, id: VoterId) -> RepoResult<bool> {
        let conn = self.connector.connect()?;
        let mut stmt = conn.prepare(EXISTS_VOTER_SQL)?;
        Ok(stmt.exists(params![id])?)
    }

    fn query_voter(&self, id: VoterId) -> RepoResult<Option<RegistryRecord>> {
        let conn = self.connector.connect()?;
        let mut stmt = conn.prepare(SELECT_VOTER_SQL)?;

        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_voter_row(row)?));
        }

        Ok(None)
    }

    fn delete_voters(&self) -> RepoResult<usize> {
        let conn = self.connector.connect()?;
        Ok(conn.execute(DELETE_VOTERS_SQL, [])?)
    }
}

fn log_failure(event: &str, id: Option<VoterId>, started_at: Instant, err: &RepoError) {
    match id {
        Some(id) => error!(
            "event={} module=repo status=error id={} duration_ms={} error={}",
            event,
            id,
            started_at.elapsed().as_millis(),
            err
        ),
        None => error!(
            "event={} module=repo status=error duration_ms={} error={}",
            event,
            started_at.elapsed().as_millis(),
            err
        ),
    }
}

fn parse_voter_row(row: &Row<'_>) -> RepoResult<RegistryRecord> {
    let id: VoterId = row.get("id")?;
    let is_alive = match row.get::<_, i64>("is_alive")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_alive value `{other}` in voters.is_alive for id {id}"
            )));
        }
    };

    Ok(RegistryRecord::new(
        id,
        row.get::<_, String>("name")?,
        row.get("age")?,
        is_alive,
    ))
}
