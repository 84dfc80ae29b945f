//! # Obsrest Store
//!
//! In-memory implementation of the observation and reference services, plus a YAML seed
//! format for loading a vocabulary, people and observations at startup.
//!
//! The store is the stand-in for a real clinical backend: the binaries and the REST tests
//! use it, the engine in `obsrest-core` only sees the service traits.

mod memory;
mod seed;

pub use memory::MemoryStore;
pub use seed::{load_seed_file, Seed};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    #[error("store failure: {0}")]
    Service(#[from] obsrest_core::ServiceError),

    #[error("unknown {resource} referenced: {uuid}")]
    UnknownReference { resource: &'static str, uuid: String },
}

/// Type alias for Results that can fail with a [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;
