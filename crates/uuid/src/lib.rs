//! Entity identifier utilities.
//!
//! Every entity exposed by the observation service (observations, concepts, persons,
//! encounters, locations, orders) is addressed by a UUID. To keep URLs and lookups
//! deterministic, the service uses a *canonical* representation for identifiers:
//! **36 characters, lowercase hex, hyphenated 8-4-4-4-12**.
//!
//! ## Canonical UUID form
//! - Length: 36
//! - Characters: `0-9`, `a-f` and `-` at positions 8, 13, 18 and 23
//! - Example: `550e8400-e29b-41d4-a716-446655440000`
//!
//! Notes:
//! - This is the same value you would get from `Uuid::new_v4().hyphenated().to_string()`.
//! - Externally supplied identifiers (URL path segments, request bodies) must already be
//!   canonical. Use [`EntityUuid::parse`] to validate them.
//! - Uppercase, braced, URN and simple (unhyphenated) forms are rejected.

mod service;

pub use service::{EntityUuid, Uuid};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
