use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

use crate::views;

#[derive(Debug, ThisError)]
pub enum LibrisError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid username and/or password")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("A user with this name already exists")]
    UsernameTaken,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),
}

impl LibrisError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Connection failures and 5xx from a provider. Timeouts are not retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Reqwest(e) => e.is_connect(),
            Self::UpstreamStatus(code) => code.is_server_error(),
            _ => false,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidCredentials => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UsernameTaken => StatusCode::CONFLICT,
            Self::Reqwest(_) | Self::UrlParse(_) | Self::UpstreamStatus(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Json(_) | Self::Io(_) | Self::DatabaseError(_) | Self::PasswordHash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<argon2::password_hash::Error> for LibrisError {
    fn from(e: argon2::password_hash::Error) -> Self {
        LibrisError::PasswordHash(e.to_string())
    }
}

impl IntoResponse for LibrisError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            match status {
                StatusCode::BAD_GATEWAY => "Upstream service is unavailable.".to_string(),
                _ => "An internal server error occurred.".to_string(),
            }
        } else {
            self.to_string()
        };
        (status, views::error_page(status, &message)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_errors_map_to_expected_status() {
        assert_eq!(
            LibrisError::validation("must provide username").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            LibrisError::not_found("No such book").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(LibrisError::UsernameTaken.status(), StatusCode::CONFLICT);
        assert!(LibrisError::UpstreamStatus(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(!LibrisError::UpstreamStatus(StatusCode::NOT_FOUND).is_retryable());
    }

    #[test]
    fn internal_errors_hide_details() {
        let resp = LibrisError::PasswordHash("boom".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
