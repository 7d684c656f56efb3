//! Error types for the ID service.
//!
//! Generation failures are split by whether a client can sensibly retry:
//! clock regressions and sequence exhaustion clear up on their own and map to
//! `503 Service Unavailable` with a `Retry-After` hint, anything else is a
//! `500`.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

pub type Result<T> = core::result::Result<T, Error>;

/// Seconds a client should wait before retrying a `503`.
pub const RETRY_AFTER_SECS: &str = "1";

/// Unified error type for the ID service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// ID generation failed for a transient reason; retrying later can
    /// succeed.
    #[error("{0}")]
    Unavailable(hexflake::Error),

    /// ID generation failed for a reason retrying will not fix.
    #[error("ID generation error: {0}")]
    Internal(hexflake::Error),
}

impl From<hexflake::Error> for Error {
    fn from(err: hexflake::Error) -> Self {
        match err {
            hexflake::Error::ClockRegression { .. } | hexflake::Error::SequenceExhausted { .. } => {
                Self::Unavailable(err)
            }
            _ => Self::Internal(err),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Self::Unavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
                self.to_string(),
            )
                .into_response(),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regression_is_retryable() {
        let err = Error::from(hexflake::Error::ClockRegression {
            stale_ms: 10,
            observed_ms: 9,
        });
        assert!(matches!(err, Error::Unavailable(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            RETRY_AFTER_SECS
        );
    }

    #[test]
    fn exhaustion_is_retryable() {
        let err = Error::from(hexflake::Error::SequenceExhausted {
            timestamp_ms: 10,
            requested: 5,
            available: 1,
        });
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn other_failures_are_internal() {
        let err = Error::from(hexflake::Error::InvalidCount);
        assert!(matches!(err, Error::Internal(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
