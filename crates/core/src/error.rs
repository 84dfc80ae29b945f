use crate::representation::Representation;
use crate::services::ServiceError;

/// Errors raised by the representation engine and the update pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ReprError {
    /// A described or submitted property has neither an override nor a generic accessor.
    #[error("property '{property}' not found on resource '{resource}'")]
    PropertyNotFound {
        resource: &'static str,
        property: String,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("resource '{resource}' has no {representation} representation")]
    UnsupportedRepresentation {
        resource: &'static str,
        representation: Representation,
    },
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },
    #[error("cycle detected projecting {resource} {uuid} at {representation}")]
    CycleDetected {
        resource: &'static str,
        uuid: String,
        representation: Representation,
    },
    #[error("projection exceeded maximum depth of {max_depth}")]
    DepthExceeded { max_depth: usize },

    #[error("property name '{property}' on resource '{resource}' is reserved or duplicated")]
    InvalidDescription {
        resource: &'static str,
        property: String,
    },
    #[error("more than one {direction} override for '{property}' on resource '{resource}'")]
    DuplicateOverride {
        resource: &'static str,
        property: String,
        direction: crate::accessor::Direction,
    },
    #[error("resource '{0}' is registered more than once")]
    DuplicateResource(&'static str),
    #[error("resource '{0}' is not registered")]
    UnknownResource(String),
    #[error("entity of resource '{found}' handed to handler for '{expected}'")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

impl From<obsrest_uuid::UuidError> for ReprError {
    fn from(err: obsrest_uuid::UuidError) -> Self {
        ReprError::InvalidInput(err.to_string())
    }
}

impl From<obsrest_types::TextError> for ReprError {
    fn from(err: obsrest_types::TextError) -> Self {
        ReprError::InvalidInput(err.to_string())
    }
}

pub type ReprResult<T> = std::result::Result<T, ReprError>;
