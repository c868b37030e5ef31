use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
};

use mercato_auth::{AccessPolicy, AccessRule, Owned};

use crate::app::errors::ApiError;
use crate::app::services::Directory;
use crate::authz::authorize_verified;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new().route("/:id", get(get_order))
}

/// GET /orders/:id
///
/// Visible to the buyer, the seller, and admin-equivalent callers. Everyone
/// else gets the same `404` as for an order that does not exist.
pub async fn get_order(
    Extension(policy): Extension<Arc<AccessPolicy>>,
    Extension(directory): Extension<Arc<dyn Directory>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    policy.require_authenticated(ctx.identity())?;

    let order = directory.find_order(&id).ok_or(ApiError::NotFound)?;
    authorize_verified(&policy, &ctx, &AccessRule::OwnerOrAdmin, &order.owner_ids())?;

    Ok(Json(order))
}
