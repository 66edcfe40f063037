//! Use-case services built on the repository port.

pub mod registry_service;
