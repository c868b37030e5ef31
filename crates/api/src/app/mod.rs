//! HTTP API application wiring (Axum router + layer composition).
//!
//! Layout:
//! - `routes/`: thin handlers that exercise the access policies
//! - `services.rs`: the storage lookup seam
//! - `errors.rs`: the single error → status boundary
//!
//! Layer order, outermost first: hardening (preflight, headers, CORS) →
//! shared extensions → identity middleware (per route group) → handler.

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use mercato_auth::{AccessPolicy, TokenCodec, TokenVerifier};
use mercato_core::AppConfig;

use crate::hardening::{self, SecurityPolicy};
use crate::middleware::{self, AuthState};

pub mod errors;
pub mod routes;
pub mod services;

use services::Directory;

/// Everything the router needs, already constructed and immutable.
pub struct AppParts {
    pub verifier: Arc<dyn TokenVerifier>,
    pub policy: AccessPolicy,
    pub security: SecurityPolicy,
    pub directory: Arc<dyn Directory>,
}

impl AppParts {
    pub fn from_config(config: &AppConfig, directory: Arc<dyn Directory>) -> Self {
        Self {
            verifier: Arc::new(TokenCodec::new(&config.auth, config.mode)),
            policy: AccessPolicy::new(config.auth.bypass_subjects.iter().cloned()),
            security: SecurityPolicy::from_config(config),
            directory,
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig, directory: Arc<dyn Directory>) -> Router {
    router(AppParts::from_config(config, directory))
}

pub fn router(parts: AppParts) -> Router {
    let auth_state = AuthState::new(parts.verifier);

    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        auth_state.clone(),
        middleware::require_identity,
    ));

    let optional = routes::optional_router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::attach_identity,
    ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .merge(optional)
        .layer(Extension(Arc::new(parts.policy)))
        .layer(Extension(parts.directory))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            Arc::new(parts.security),
            hardening::harden,
        )))
}
