use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::auth::services::{LoginError, PasswordChangeError};

/// Client-facing failure body: a single human readable message.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid_body() -> Self {
        ApiError::BadRequest("Invalid request body".into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) => msg,
            ApiError::Internal(e) => {
                // Do not leak implementation details to clients.
                error!(error = %e, "request failed");
                "Internal server error".to_string()
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<PasswordChangeError> for ApiError {
    fn from(e: PasswordChangeError) -> Self {
        match e {
            PasswordChangeError::MissingFields
            | PasswordChangeError::TooShort
            | PasswordChangeError::IncorrectCurrentPassword => ApiError::BadRequest(e.to_string()),
            PasswordChangeError::UserNotFound => ApiError::Unauthorized(e.to_string()),
            PasswordChangeError::Hash(e) => ApiError::Internal(e.into()),
            PasswordChangeError::Store(e) => ApiError::Internal(e),
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::InvalidEmail => ApiError::BadRequest(e.to_string()),
            LoginError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            LoginError::Hash(e) => ApiError::Internal(e.into()),
            LoginError::Store(e) => ApiError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, ErrorBody) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_failures_keep_their_message() {
        let (status, body) = body_of(PasswordChangeError::TooShort.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.detail, "New password must be at least 8 characters long");
    }

    #[tokio::test]
    async fn internal_errors_are_redacted() {
        let err = ApiError::Internal(anyhow::anyhow!("connection refused on 10.0.0.3:5432"));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.detail, "Internal server error");
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let (status, body) = body_of(LoginError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.detail, "Invalid credentials");
    }
}
