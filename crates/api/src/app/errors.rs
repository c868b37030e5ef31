//! The single boundary where typed failures become status codes.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use mercato_auth::PolicyDenied;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("no token provided")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error(transparent)]
    Denied(#[from] PolicyDenied),

    #[error("not found")]
    NotFound,

    /// Details are logged where the fault happens, never rendered.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingToken | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Denied(PolicyDenied::Unauthenticated) => StatusCode::UNAUTHORIZED,
            ApiError::Denied(PolicyDenied::Forbidden(_) | PolicyDenied::SelfTarget) => StatusCode::FORBIDDEN,
            ApiError::Denied(PolicyDenied::NotFound) | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingToken => "no_token",
            ApiError::InvalidToken => "invalid_token",
            ApiError::Denied(PolicyDenied::Unauthenticated) => "unauthenticated",
            ApiError::Denied(PolicyDenied::Forbidden(_)) => "forbidden",
            ApiError::Denied(PolicyDenied::SelfTarget) => "self_target",
            ApiError::Denied(PolicyDenied::NotFound) | ApiError::NotFound => "not_found",
            ApiError::Internal => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        json_error(self.status(), self.code(), self.to_string())
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
