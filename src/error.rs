use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Error surfaced by every order-service operation.
///
/// Callers distinguish failures by variant only; log level is not part of the contract.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{service} call failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("persistence error: malformed stored value: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn upstream(service: &'static str, message: impl ToString) -> Self {
        Self::Upstream {
            service,
            message: message.to_string(),
        }
    }

    /// Shared state of an in-memory store was poisoned by a panicking writer.
    pub fn poisoned(store: &'static str, e: impl std::fmt::Display) -> Self {
        Self::Persistence(sqlx::Error::Protocol(format!("{store} lock poisoned: {e}")))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// NotFound and Validation are the expected outcomes of bad input.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Validation(_))
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Persistence(_) | Self::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        let cases = [
            (ServiceError::not_found("order", "x"), StatusCode::NOT_FOUND),
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ServiceError::upstream("kitchen directory", "timeout"), StatusCode::BAD_GATEWAY),
            (
                ServiceError::Persistence(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = ServiceError::not_found("dish", "42");
        assert_eq!(err.to_string(), "dish 42 not found");
        assert!(err.is_not_found());
        assert!(err.is_expected());
        assert!(!ServiceError::upstream("user directory", "boom").is_expected());
    }
}
