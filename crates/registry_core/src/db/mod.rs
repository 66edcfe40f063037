//! SQLite connection acquisition for the voter registry.
//!
//! # Responsibility
//! - Validate store configuration before any connection is attempted.
//! - Open one fresh, configured SQLite connection per request.
//!
//! # Invariants
//! - Connections are never cached; callers own and drop them.
//! - Storage errors are carried unchanged inside `DbError::Sqlite`.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod config;
mod connect;

pub use config::StoreConfig;
pub use connect::{ConnectionFactory, SqliteConnector};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidConfig(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidConfig(message) => write!(f, "invalid store configuration: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidConfig(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
