//! Domain model for the voter registry.
//!
//! # Responsibility
//! - Define the record shape shared by the port, the adapter and callers.
//!
//! # Invariants
//! - A record is identified by its caller-assigned `VoterId`.
//! - Deletion is a bulk wipe; there is no per-record tombstone.

pub mod record;
