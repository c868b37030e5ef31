//! `mercato-auth`: token and access-policy core (transport-agnostic).
//!
//! This crate knows nothing about HTTP. The API crate extracts credentials,
//! calls into here, and maps the typed failures onto status codes.

pub mod claims;
pub mod codec;
pub mod policy;
pub mod principal;
pub mod roles;

pub use claims::{IdentityClaim, InvalidTokenError, TokenPayload};
pub use codec::{TokenCodec, TokenError, TokenVerifier};
pub use policy::{AccessPolicy, AccessRule, Owned, PolicyDenied};
pub use principal::Identity;
pub use roles::{Role, UnknownRole};
