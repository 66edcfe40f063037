//! Voter registry record model.
//!
//! # Responsibility
//! - Define the canonical value stored in (and read back from) `voters`.
//! - Provide the caller-side length check mirrored by the storage constraint.
//!
//! # Invariants
//! - `id` is assigned by the caller and never reassigned once persisted.
//! - `name` holds at most `NAME_MAX_CHARS` characters once stored.
//! - Records are immutable after construction.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Externally supplied primary key of a voter.
pub type VoterId = i32;

/// Maximum stored name length, counted in characters.
pub const NAME_MAX_CHARS: usize = 100;

/// Validation failures detected before a record reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    NameTooLong { id: VoterId, chars: usize },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameTooLong { id, chars } => write!(
                f,
                "voter {id} name has {chars} characters; at most {NAME_MAX_CHARS} are allowed"
            ),
        }
    }
}

impl Error for RecordValidationError {}

/// One row of the voter registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    id: VoterId,
    name: String,
    age: i32,
    #[serde(rename = "isAlive")]
    is_alive: bool,
}

impl RegistryRecord {
    /// Builds a record without validation.
    ///
    /// Rows loaded from storage and caller input share this constructor;
    /// use [`RegistryRecord::validate`] before handing caller input to a
    /// write path that should fail early.
    pub fn new(id: VoterId, name: impl Into<String>, age: i32, is_alive: bool) -> Self {
        Self {
            id,
            name: name.into(),
            age,
            is_alive,
        }
    }

    pub fn id(&self) -> VoterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    /// Checks the bounded-length rule enforced by the `voters` table.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        let chars = self.name.chars().count();
        if chars > NAME_MAX_CHARS {
            return Err(RecordValidationError::NameTooLong { id: self.id, chars });
        }
        Ok(())
    }
}
