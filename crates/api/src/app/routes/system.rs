use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde_json::json;

use mercato_auth::PolicyDenied;

use crate::app::errors::ApiError;
use crate::context::RequestContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<RequestContext>) -> Result<impl IntoResponse, ApiError> {
    let claim = ctx.claim().ok_or(PolicyDenied::Unauthenticated)?;
    Ok(Json(claim.clone()))
}

/// Anonymous callers get the public view; verified callers are told who they are.
pub async fn feed(Extension(ctx): Extension<RequestContext>) -> impl IntoResponse {
    let identity = ctx.identity();
    Json(json!({
        "authenticated": identity.is_verified(),
        "userId": identity.subject(),
        "role": identity.role(),
    }))
}
