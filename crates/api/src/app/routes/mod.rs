use axum::{Router, routing::get};

pub mod admin;
pub mod orders;
pub mod system;

/// Routes that need no identity.
pub fn public_router() -> Router {
    Router::new().route("/health", get(system::health))
}

/// Routes that run with or without a verified identity.
pub fn optional_router() -> Router {
    Router::new().route("/feed", get(system::feed))
}

/// Routes that require a verified identity.
pub fn protected_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/admin", admin::router())
        .nest("/orders", orders::router())
}
