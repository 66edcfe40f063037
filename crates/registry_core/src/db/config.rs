//! Store address and credential configuration.
//!
//! # Invariants
//! - `address` is non-empty and does not name a private in-memory or
//!   temporary database.
//! - The password never appears in `Debug` output or logs.

use super::{DbError, DbResult};
use serde::Deserialize;
use std::fmt::{Debug, Formatter};

const SQLITE_SCHEME_PREFIXES: [&str; 2] = ["sqlite://", "sqlite:"];

/// Connection settings fixed at adapter construction.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    address: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl StoreConfig {
    /// Address-only shape; the store is accessed without credentials.
    pub fn anonymous(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            username: None,
            password: None,
        }
    }

    /// Address plus username/password shape.
    ///
    /// SQLite has no user authentication, so credentials are retained for
    /// reporting only and are not sent to the store.
    pub fn with_credentials(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn has_credentials(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }

    /// Label used in connection log events.
    pub(crate) fn auth_label(&self) -> &'static str {
        if self.has_credentials() {
            "credentials"
        } else {
            "anonymous"
        }
    }

    /// Returns the location handed to SQLite, with any `sqlite:` scheme
    /// prefix removed. `file:` URIs pass through untouched.
    pub fn database_location(&self) -> &str {
        let trimmed = self.address.trim();
        SQLITE_SCHEME_PREFIXES
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed)
    }

    /// Rejects addresses that cannot persist across per-call connections.
    pub fn validate(&self) -> DbResult<()> {
        let location = self.database_location();
        if location.is_empty() {
            return Err(DbError::InvalidConfig(
                "store address cannot be empty".to_string(),
            ));
        }
        if is_transient_location(location) {
            return Err(DbError::InvalidConfig(format!(
                "address `{location}` names a private temporary or in-memory database, which does not persist across per-operation connections"
            )));
        }
        Ok(())
    }
}

impl Debug for StoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// True for locations where SQLite opens a fresh database per connection:
/// `:memory:`, memory-mode URIs and `file:` URIs with an empty path.
fn is_transient_location(location: &str) -> bool {
    if location == ":memory:" {
        return true;
    }
    let Some(uri) = location.strip_prefix("file:") else {
        return false;
    };
    if uri.starts_with(":memory:") || uri.contains("mode=memory") {
        return true;
    }

    let path = uri.split(['?', '#']).next().unwrap_or_default();
    let path = match path.strip_prefix("//") {
        Some(with_authority) => with_authority
            .find('/')
            .map_or("", |start| &with_authority[start..]),
        None => path,
    };
    path.is_empty()
}
