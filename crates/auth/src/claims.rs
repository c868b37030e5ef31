use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Role;

/// Verified identity carried by a token.
///
/// All three fields are always present; a request either has a complete
/// claim or none at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityClaim {
    /// Subject identifier (opaque).
    #[serde(rename = "userId")]
    pub user_id: String,

    pub email: String,

    pub role: Role,
}

impl IdentityClaim {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            role,
        }
    }
}

/// Signed payload: the claim plus its validity window (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(flatten)]
    pub claim: IdentityClaim,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,
}

impl TokenPayload {
    pub fn new(claim: IdentityClaim, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            claim,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidTokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,
}

/// Check the expiry of a decoded payload against `now`.
///
/// Only `exp` is enforced. `iat` is informational, so a token minted on a
/// host whose clock runs ahead is still accepted.
pub fn validate_window(payload: &TokenPayload, now: DateTime<Utc>) -> Result<(), InvalidTokenError> {
    if now.timestamp() >= payload.exp {
        return Err(InvalidTokenError::Expired);
    }
    Ok(())
}
