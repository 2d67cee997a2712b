use crate::services::account_service::AccountServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("User already exists")]
    Conflict,

    #[error("User not found")]
    NotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal(String),
}

impl From<AccountServiceError> for AppError {
    fn from(err: AccountServiceError) -> Self {
        match err {
            AccountServiceError::MissingFields => {
                AppError::Validation("All fields are required".to_string())
            }
            AccountServiceError::EmailTaken => AppError::Conflict,
            AccountServiceError::UserNotFound => AppError::NotFound,
            AccountServiceError::InvalidCredentials => AppError::InvalidCredentials,
            AccountServiceError::InvalidToken => AppError::InvalidToken,
            AccountServiceError::Hashing(msg) => AppError::Internal(msg),
            AccountServiceError::Repository(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InvalidCredentials => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidToken => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Database(e) => {
                // Detail stays server-side; the client only sees a generic
                // failure.
                tracing::error!("Database failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({
            "success": false,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_failures_keep_their_messages() {
        assert_eq!(AppError::Conflict.to_string(), "User already exists");
        assert_eq!(AppError::NotFound.to_string(), "User not found");
        assert_eq!(
            AppError::InvalidToken.to_string(),
            "Invalid or expired token"
        );
    }

    #[test]
    fn service_errors_map_to_the_client_taxonomy() {
        assert!(matches!(
            AppError::from(AccountServiceError::MissingFields),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(AccountServiceError::EmailTaken),
            AppError::Conflict
        ));
        assert!(matches!(
            AppError::from(AccountServiceError::InvalidCredentials),
            AppError::InvalidCredentials
        ));
        assert!(matches!(
            AppError::from(AccountServiceError::Hashing("boom".to_string())),
            AppError::Internal(_)
        ));
    }
}
