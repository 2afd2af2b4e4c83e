// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::ErrorResponse;

/// Classified failure of a single upstream completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("upstream request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("upstream rejected credentials ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("upstream rate limit exceeded: {message}")]
    RateLimited { message: String },

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("upstream returned status {status}: {message}")]
    Upstream { status: u16, message: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request body")]
    InvalidBody,

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidBody => StatusCode::BAD_REQUEST,
            // Every upstream classification maps to 500 for now.
            AppError::Completion(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_body_is_bad_request() {
        let err = AppError::InvalidBody;
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "invalid request body");
    }

    #[test]
    fn completion_errors_collapse_to_500() {
        let errors = [
            CompletionError::Auth { status: 401, message: "bad key".into() },
            CompletionError::RateLimited { message: "slow down".into() },
            CompletionError::MalformedResponse("no choices".into()),
            CompletionError::Upstream { status: 503, message: "overloaded".into() },
        ];
        for err in errors {
            let app: AppError = err.into();
            assert_eq!(app.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!app.to_string().is_empty());
        }
    }

    #[test]
    fn rate_limit_text_mentions_limit() {
        let err = AppError::from(CompletionError::RateLimited {
            message: "Please retry in 20s".into(),
        });
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn display_keeps_upstream_message() {
        let err = AppError::from(CompletionError::Auth {
            status: 401,
            message: "Incorrect API key provided".into(),
        });
        assert_eq!(
            err.to_string(),
            "upstream rejected credentials (401): Incorrect API key provided"
        );
    }
}
