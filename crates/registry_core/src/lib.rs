//! Voter registry persistence core.
//! Stores voter records in SQLite behind a narrow repository port.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{ConnectionFactory, DbError, DbResult, SqliteConnector, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogOutput};
pub use model::record::{RecordValidationError, RegistryRecord, VoterId, NAME_MAX_CHARS};
pub use repo::registry_repo::{
    RegistryRepositoryPort, RepoError, RepoResult, SqliteRegistryStore,
};
pub use service::registry_service::{RegisterOutcome, RegistryService, RegistryServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
