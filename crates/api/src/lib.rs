//! HTTP edge: identity propagation, response hardening and the error boundary.

pub mod app;
pub mod authz;
pub mod context;
pub mod hardening;
pub mod middleware;

pub use app::errors::ApiError;
pub use context::RequestContext;
