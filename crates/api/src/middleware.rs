//! Identity propagation middleware.
//!
//! Two layers over the same extraction step:
//! - [`require_identity`]: no verified identity, no handler call.
//! - [`attach_identity`]: the handler always runs, with or without identity.
//!
//! Both convert a fault inside extraction/verification into a `500`.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use mercato_auth::{Identity, IdentityClaim, InvalidTokenError, TokenError, TokenVerifier};

use crate::app::errors::ApiError;
use crate::context::RequestContext;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AuthState {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }
}

/// Outcome of a failed credential resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No usable `Authorization: Bearer <token>` header.
    Missing,
    /// A token was presented but did not verify.
    Invalid(InvalidTokenError),
    /// Something other than the token itself went wrong.
    Fault(String),
}

/// Mandatory mode: reject with `401` unless a verified identity is present.
pub async fn require_identity(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match resolve_identity(state.verifier.as_ref(), req.headers()) {
        Ok(claim) => {
            req.extensions_mut().insert(RequestContext::verified(claim));
            Ok(next.run(req).await)
        }
        Err(CredentialError::Missing) => {
            tracing::warn!(target: "security", uri = %req.uri(), "auth_missing");
            Err(ApiError::MissingToken)
        }
        Err(CredentialError::Invalid(e)) => {
            tracing::warn!(target: "security", uri = %req.uri(), error = %e, "auth_failed");
            Err(ApiError::InvalidToken)
        }
        Err(CredentialError::Fault(detail)) => {
            tracing::error!(target: "security", uri = %req.uri(), %detail, "auth_fault");
            Err(ApiError::Internal)
        }
    }
}

/// Optional mode: attach an identity when one verifies, otherwise continue
/// anonymously.
pub async fn attach_identity(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match resolve_identity(state.verifier.as_ref(), req.headers()) {
        Ok(claim) => Identity::Verified(claim),
        Err(CredentialError::Missing) => Identity::Anonymous,
        Err(CredentialError::Invalid(e)) => {
            tracing::debug!(target: "security", uri = %req.uri(), error = %e, "optional auth ignored invalid token");
            Identity::Anonymous
        }
        Err(CredentialError::Fault(detail)) => {
            tracing::error!(target: "security", uri = %req.uri(), %detail, "auth_fault");
            return Err(ApiError::Internal);
        }
    };

    req.extensions_mut().insert(RequestContext::new(identity));
    Ok(next.run(req).await)
}

/// Extract and verify the bearer credential.
///
/// A panic inside verification is caught and reported as `Fault`.
pub fn resolve_identity(verifier: &dyn TokenVerifier, headers: &HeaderMap) -> Result<IdentityClaim, CredentialError> {
    let token = extract_bearer(headers).ok_or(CredentialError::Missing)?;

    let outcome = catch_unwind(AssertUnwindSafe(|| verifier.verify(token)));
    match outcome {
        Ok(Ok(claim)) => Ok(claim),
        Ok(Err(TokenError::Invalid(e))) => Err(CredentialError::Invalid(e)),
        Ok(Err(e @ (TokenError::Config(_) | TokenError::InvalidLifetime | TokenError::Encoding(_)))) => {
            Err(CredentialError::Fault(e.to_string()))
        }
        Err(payload) => Err(CredentialError::Fault(panic_message(payload.as_ref()))),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic during verification: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic during verification: {s}")
    } else {
        "panic during verification".to_string()
    }
}
