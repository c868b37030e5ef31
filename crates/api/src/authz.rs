//! API-side access guard.
//!
//! Handlers call [`authorize`] with their declared rule before touching any
//! resource; the denial converts straight into an [`ApiError`].

use mercato_auth::{AccessPolicy, AccessRule, IdentityClaim};

use crate::app::errors::ApiError;
use crate::context::RequestContext;

/// Evaluate `rule` for the current request.
pub fn authorize<'a>(
    policy: &AccessPolicy,
    ctx: &'a RequestContext,
    rule: &AccessRule,
    owner_fields: &[&str],
) -> Result<Option<&'a IdentityClaim>, ApiError> {
    rule.evaluate(policy, ctx.identity(), owner_fields).map_err(ApiError::from)
}

/// Evaluate a rule that implies authentication and return the claim.
pub fn authorize_verified<'a>(
    policy: &AccessPolicy,
    ctx: &'a RequestContext,
    rule: &AccessRule,
    owner_fields: &[&str],
) -> Result<&'a IdentityClaim, ApiError> {
    authorize(policy, ctx, rule, owner_fields)?.ok_or(ApiError::Denied(mercato_auth::PolicyDenied::Unauthenticated))
}
