//! Error translation
//!
//! Every failure reaching the HTTP edge is an [`AppError`] and leaves as an
//! [`ErrorBody`] envelope:
//!
//! | Variant | Status | message |
//! |---------|--------|---------|
//! | Auth (header / token / claims) | 401 | verifier description |
//! | Auth (permission missing) | 403 | "Permission not found." |
//! | BadRequest | 400 | "bad request" |
//! | NotFound | 404 | "not found: <context>" |
//! | MethodNotAllowed | 405 | "method not allowed" |
//! | Unprocessable / PersistFailed | 422 | "unprocessable" |
//! | Internal | 500 | "internal error" |
//!
//! Detail is logged, never sent to the caller. Store and internal causes go
//! out at `error`, request faults at `debug`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::{ErrorBody, RecipeError};
use tracing::error;

use crate::auth::AuthError;
use crate::db::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    /// Token or permission failure (401 / 403)
    Auth(#[from] AuthError),

    #[error("Bad request: {0}")]
    /// Body missing, not JSON, or lacking required keys (400)
    BadRequest(String),

    #[error("Not found: {0}")]
    /// Unknown drink id or route (404)
    NotFound(String),

    #[error("Method not allowed")]
    /// Known path, wrong method (405)
    MethodNotAllowed,

    #[error("Unprocessable: {0}")]
    /// Field of the wrong type or shape (422)
    Unprocessable(String),

    #[error("Write failed: {0}")]
    /// Store rejected or could not perform a write (422)
    PersistFailed(String),

    #[error("Internal error: {0}")]
    /// Everything else (500)
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unprocessable(cause: impl std::fmt::Display) -> Self {
        Self::Unprocessable(cause.to_string())
    }

    pub fn persist_failed(cause: impl std::fmt::Display) -> Self {
        Self::PersistFailed(cause.to_string())
    }

    pub fn internal(cause: impl std::fmt::Display) -> Self {
        Self::Internal(cause.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(AuthError::Unauthorized) => StatusCode::FORBIDDEN,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Unprocessable(_) | AppError::PersistFailed(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The cause lies with the server or the store, not the request
    pub fn is_server_fault(&self) -> bool {
        matches!(self, AppError::PersistFailed(_) | AppError::Internal(_))
    }

    /// Machine-readable reason
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Auth(e) => e.code(),
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::MethodNotAllowed => "method_not_allowed",
            AppError::Unprocessable(_) | AppError::PersistFailed(_) => "unprocessable",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_fault() {
            error!(target: "internal", error = %self, "Request failed");
        } else if !matches!(self, AppError::Auth(_)) {
            tracing::debug!(detail = %self, "Request rejected");
        }

        let status = self.status();
        let message = match &self {
            AppError::Auth(e) => e.to_string(),
            AppError::BadRequest(_) => "bad request".to_string(),
            AppError::NotFound(context) => format!("not found: {context}"),
            AppError::MethodNotAllowed => "method not allowed".to_string(),
            AppError::Unprocessable(_) | AppError::PersistFailed(_) => "unprocessable".to_string(),
            AppError::Internal(_) => "internal error".to_string(),
        };

        let body = Json(ErrorBody::new(status.as_u16(), message, self.code()));
        (status, body).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// A stored recipe that no longer decodes is a server fault
impl From<RecipeError> for AppError {
    fn from(err: RecipeError) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
