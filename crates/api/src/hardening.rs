//! Response hardening: security headers, CORS, and preflight handling.
//!
//! Applied outermost so it sees every response, including rejections from
//! the identity middleware.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CONTENT_SECURITY_POLICY, ORIGIN,
            REFERRER_POLICY, STRICT_TRANSPORT_SECURITY, VARY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
            X_XSS_PROTECTION,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use mercato_core::{AppConfig, CorsConfig, RuntimeMode};

const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

const CSP: &str = "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; \
img-src 'self' data: https:; font-src 'self'; connect-src 'self'; object-src 'none'; \
frame-ancestors 'none'; base-uri 'self'; form-action 'self'";
const HSTS: &str = "max-age=31536000; includeSubDomains";
const CORS_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const CORS_HEADERS: &str = "Content-Type, Authorization";
const CORS_MAX_AGE: &str = "86400";

/// Process-wide header and origin policy.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    hardened: bool,
    allowed_origins: HashSet<String>,
}

impl SecurityPolicy {
    pub fn new(mode: RuntimeMode, cors: &CorsConfig) -> Self {
        Self {
            hardened: mode.is_hardened(),
            allowed_origins: cors.allowed_origins.iter().cloned().collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.mode, &config.cors)
    }

    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        self.allowed_origins.contains(origin)
    }

    /// Set the fixed security headers. Existing values are replaced, so
    /// applying twice yields the same headers.
    pub fn apply_security_headers(&self, headers: &mut HeaderMap) {
        headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP));
        headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        headers.insert(REFERRER_POLICY, HeaderValue::from_static("strict-origin-when-cross-origin"));
        headers.insert(
            PERMISSIONS_POLICY,
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        );
        if self.hardened {
            headers.insert(STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS));
        }
    }

    /// Add CORS headers when `origin` is allow-listed. Returns whether it was.
    ///
    /// Any request carrying an `Origin` gets `Vary: Origin`. Unknown origins
    /// get nothing else; the browser then refuses cross-origin script access
    /// on its own.
    pub fn apply_cors(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) -> bool {
        let Some(origin) = origin else {
            return false;
        };
        vary_on_origin(headers);

        let allowed = origin.to_str().map(|o| self.is_allowed_origin(o)).unwrap_or(false);
        if !allowed {
            return false;
        }

        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(CORS_METHODS));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(CORS_HEADERS));
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(CORS_MAX_AGE));
        headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        true
    }
}

fn vary_on_origin(headers: &mut HeaderMap) {
    let present = headers
        .get_all(VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|v| v.trim().eq_ignore_ascii_case("origin"));
    if !present {
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}

/// Axum middleware: answer preflights, then harden whatever comes back.
pub async fn harden(State(policy): State<Arc<SecurityPolicy>>, req: Request, next: Next) -> Response {
    let origin = req.headers().get(ORIGIN).cloned();

    let mut response = if req.method() == Method::OPTIONS {
        tracing::debug!(uri = %req.uri(), "answering preflight");
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    policy.apply_cors(origin.as_ref(), response.headers_mut());
    policy.apply_security_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(mode: RuntimeMode) -> SecurityPolicy {
        SecurityPolicy::new(mode, &CorsConfig::default())
    }

    #[test]
    fn security_headers_are_idempotent() {
        let p = policy(RuntimeMode::Development);
        let mut once = HeaderMap::new();
        p.apply_security_headers(&mut once);
        let mut twice = once.clone();
        p.apply_security_headers(&mut twice);

        assert_eq!(once, twice);
        assert_eq!(once.len(), 6);
        assert_eq!(once[X_FRAME_OPTIONS], "DENY");
        assert_eq!(once[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(once.get(STRICT_TRANSPORT_SECURITY).is_none());
    }

    #[test]
    fn hsts_only_when_hardened() {
        let mut headers = HeaderMap::new();
        policy(RuntimeMode::Production).apply_security_headers(&mut headers);
        assert_eq!(headers[STRICT_TRANSPORT_SECURITY], HSTS);
    }

    #[test]
    fn cors_for_allow_listed_origin_only() {
        let p = policy(RuntimeMode::Development);

        let mut allowed = HeaderMap::new();
        let origin = HeaderValue::from_static("http://localhost:3000");
        assert!(p.apply_cors(Some(&origin), &mut allowed));
        assert_eq!(allowed[ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
        assert_eq!(allowed[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(allowed[ACCESS_CONTROL_MAX_AGE], "86400");

        let mut denied = HeaderMap::new();
        let evil = HeaderValue::from_static("https://evil.example");
        assert!(!p.apply_cors(Some(&evil), &mut denied));
        assert!(denied.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(denied.len(), 1);
        assert_eq!(denied[VARY], "Origin");

        let mut absent = HeaderMap::new();
        assert!(!p.apply_cors(None, &mut absent));
        assert!(absent.is_empty());
    }

    #[test]
    fn vary_origin_is_not_duplicated() {
        let p = policy(RuntimeMode::Development);
        let origin = HeaderValue::from_static("http://localhost:5173");
        let mut headers = HeaderMap::new();
        headers.insert(VARY, HeaderValue::from_static("Accept-Encoding, Origin"));

        p.apply_cors(Some(&origin), &mut headers);
        assert_eq!(headers.get_all(VARY).iter().count(), 1);
    }
}
