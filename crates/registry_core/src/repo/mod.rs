//! Repository port and persistence implementation.
//!
//! # Responsibility
//! - Define the narrow data access contract callers depend on.
//! - Keep SQL details inside the SQLite adapter.
//!
//! # Invariants
//! - Repository APIs return storage failures unchanged; absence on lookup is
//!   `Ok(None)`, never an error.

pub mod registry_repo;
