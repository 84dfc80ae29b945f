//! Mapping of engine errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use obsrest_core::{ReprError, ServiceError};
use serde::Serialize;
use utoipa::ToSchema;

/// Error payload returned by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorRes {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    /// Stable machine-readable error kind, e.g. `not_found`.
    pub code: String,
}

/// An error ready to be rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "invalid_input",
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<ReprError> for ApiError {
    fn from(err: ReprError) -> Self {
        let (status, code) = match &err {
            ReprError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            ReprError::UnsupportedRepresentation { .. } => {
                (StatusCode::BAD_REQUEST, "unsupported_representation")
            }
            ReprError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            ReprError::Service(ServiceError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "validation_failed")
            }
            ReprError::Service(ServiceError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {err:?}");
        } else {
            tracing::debug!(code, "request rejected: {err}");
        }
        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorRes {
            error: ErrorBody {
                message: self.message,
                code: self.code.to_string(),
            },
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obsrest_core::Representation;

    #[test]
    fn maps_engine_errors_to_status_codes() {
        let cases = [
            (
                ReprError::InvalidInput("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ReprError::UnsupportedRepresentation {
                    resource: "obs",
                    representation: Representation::Ref,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                ReprError::NotFound {
                    resource: "obs",
                    id: "x".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                ReprError::Service(ServiceError::Validation("concept".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ReprError::Service(ServiceError::NotFound("obs".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ReprError::Service(ServiceError::Storage("disk".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ReprError::PropertyNotFound {
                    resource: "obs",
                    property: "colour".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ReprError::DepthExceeded { max_depth: 2 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
