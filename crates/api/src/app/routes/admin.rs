//! Admin-only account actions.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use serde_json::json;

use mercato_auth::{AccessPolicy, AccessRule};

use crate::app::errors::ApiError;
use crate::app::services::Directory;
use crate::authz::authorize_verified;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/overview", get(overview))
        .route("/users/:id", delete(delete_user))
}

/// GET /admin/overview
pub async fn overview(
    Extension(policy): Extension<Arc<AccessPolicy>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, ApiError> {
    let claim = authorize_verified(&policy, &ctx, &AccessRule::AdminOnly, &[])?;

    Ok(Json(json!({
        "userId": claim.user_id,
        "role": claim.role,
        "bypass": policy.is_bypass(claim),
    })))
}

/// DELETE /admin/users/:id
///
/// Admin-only, and never against the caller's own account.
pub async fn delete_user(
    Extension(policy): Extension<Arc<AccessPolicy>>,
    Extension(directory): Extension<Arc<dyn Directory>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = authorize_verified(&policy, &ctx, &AccessRule::AdminOnly, &[])?;
    policy.forbid_self_target(ctx.identity(), &id)?;

    if !directory.remove_user(&id) {
        return Err(ApiError::NotFound);
    }

    tracing::info!(target: "security", actor = %actor.user_id, removed = %id, "user removed");
    Ok(StatusCode::NO_CONTENT)
}
