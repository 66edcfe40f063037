//! Voter registration use-case service.
//!
//! # Responsibility
//! - Provide the check-then-insert registration flow on top of the port.
//! - Report duplicates as an outcome instead of a failure.
//!
//! # Invariants
//! - The service never bypasses the repository port.
//! - Storage failures other than duplicate ids propagate unchanged.

use crate::model::record::{RecordValidationError, RegistryRecord, VoterId};
use crate::repo::registry_repo::{RegistryRepositoryPort, RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    AlreadyRegistered,
}

#[derive(Debug)]
pub enum RegistryServiceError {
    Validation(RecordValidationError),
    Repo(RepoError),
}

impl Display for RegistryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RegistryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RecordValidationError> for RegistryServiceError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for RegistryServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case wrapper around a registry repository.
pub struct RegistryService<R: RegistryRepositoryPort> {
    repo: R,
}

impl<R: RegistryRepositoryPort> RegistryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Ensures the backing table exists.
    pub fn prepare(&self) -> RepoResult<()> {
        self.repo.init_schema()
    }

    /// Registers `record` unless its id is already taken.
    ///
    /// # Contract
    /// - Invalid records fail with `RegistryServiceError::Validation` and
    ///   never reach storage.
    /// - A constraint violation raised by a racing insert is reported as
    ///   `AlreadyRegistered`, same as the pre-check.
    pub fn register(
        &self,
        record: &RegistryRecord,
    ) -> Result<RegisterOutcome, RegistryServiceError> {
        record.validate()?;

        if self.repo.exists_by_id(record.id())? {
            info!(
                "event=voter_register module=service status=duplicate id={}",
                record.id()
            );
            return Ok(RegisterOutcome::AlreadyRegistered);
        }

        match self.repo.save_record(record) {
            Ok(()) => Ok(RegisterOutcome::Registered),
            Err(err) if err.is_constraint_violation() && self.repo.exists_by_id(record.id())? => {
                info!(
                    "event=voter_register module=service status=duplicate id={} race=true",
                    record.id()
                );
                Ok(RegisterOutcome::AlreadyRegistered)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn lookup(&self, id: VoterId) -> RepoResult<Option<RegistryRecord>> {
        self.repo.find_by_id(id)
    }

    /// Wipes the registry. Intended for test and reset workflows.
    pub fn reset(&self) -> RepoResult<()> {
        self.repo.delete_all()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}
