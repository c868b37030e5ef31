//! Token codec: issues and verifies HS256-signed identity tokens.
//!
//! Verification is a pure function of (token, signing secret, time). The codec
//! holds only immutable keys and can be shared across threads without locking.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use mercato_core::{AuthConfig, ConfigError, RuntimeMode, check_secret};

use crate::claims::{IdentityClaim, InvalidTokenError, TokenPayload, validate_window};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The codec cannot sign or verify with the configured secret.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The presented token is not acceptable.
    #[error(transparent)]
    Invalid(#[from] InvalidTokenError),

    /// `now + ttl` is outside the representable time range.
    #[error("token lifetime out of range")]
    InvalidLifetime,

    /// Serialising the payload failed.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and verifies identity tokens with the process signing secret.
pub struct TokenCodec {
    keys: Result<Keys, ConfigError>,
    default_lifetime: Duration,
    header: Header,
    validation: Validation,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("keys", &self.keys.as_ref().map(|_| "<hs256>"))
            .field("default_lifetime", &self.default_lifetime)
            .finish()
    }
}

impl TokenCodec {
    /// Build a codec from configuration.
    ///
    /// Construction never fails: a missing secret (or, in hardened mode, a weak
    /// one) is remembered and returned from every `issue`/`verify` call. Outside
    /// hardened mode a weak secret is accepted with a warning.
    pub fn new(config: &AuthConfig, mode: RuntimeMode) -> Self {
        let keys = match config.secret.as_deref() {
            None => Err(ConfigError::Missing("JWT_SECRET")),
            Some(secret) => match check_secret(secret) {
                Err(e) if mode.is_hardened() => Err(e),
                checked => {
                    if let Err(e) = checked {
                        tracing::warn!(mode = %mode, error = %e, "accepting weak signing secret outside production");
                    }
                    Ok(Keys {
                        encoding: EncodingKey::from_secret(secret.as_bytes()),
                        decoding: DecodingKey::from_secret(secret.as_bytes()),
                    })
                }
            },
        };

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller-supplied clock in `verify_at`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            keys,
            default_lifetime: config.token_lifetime,
            header: Header::new(Algorithm::HS256),
            validation,
        }
    }

    pub fn default_lifetime(&self) -> Duration {
        self.default_lifetime
    }

    /// Whether the codec can sign and verify at all.
    pub fn is_configured(&self) -> bool {
        self.keys.is_ok()
    }

    fn keys(&self) -> Result<&Keys, ConfigError> {
        self.keys.as_ref().map_err(|e| e.clone())
    }

    /// Issue a token valid for `ttl` from now.
    pub fn issue(&self, claim: &IdentityClaim, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(claim, ttl, Utc::now())
    }

    /// Issue a token with the configured default lifetime.
    pub fn issue_default(&self, claim: &IdentityClaim) -> Result<String, TokenError> {
        self.issue(claim, self.default_lifetime)
    }

    pub fn issue_at(
        &self,
        claim: &IdentityClaim,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let keys = self.keys()?;
        let expires_at = now.checked_add_signed(ttl).ok_or(TokenError::InvalidLifetime)?;
        let payload = TokenPayload::new(claim.clone(), now, expires_at);
        encode(&self.header, &payload, &keys.encoding).map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify signature and expiry against the current time.
    pub fn verify(&self, token: &str) -> Result<IdentityClaim, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaim, TokenError> {
        let keys = self.keys()?;

        let data = decode::<TokenPayload>(token, &keys.decoding, &self.validation).map_err(|e| {
            let invalid = match e.kind() {
                ErrorKind::InvalidSignature => InvalidTokenError::BadSignature,
                ErrorKind::ExpiredSignature => InvalidTokenError::Expired,
                _ => InvalidTokenError::Malformed(e.to_string()),
            };
            TokenError::Invalid(invalid)
        })?;

        validate_window(&data.claims, now)?;
        Ok(data.claims.claim)
    }
}

/// Verification seam used by the HTTP layer.
///
/// Implementations must be pure with respect to shared state so they can be
/// invoked from any number of requests concurrently.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<IdentityClaim, TokenError>;
}

impl TokenVerifier for TokenCodec {
    fn verify(&self, token: &str) -> Result<IdentityClaim, TokenError> {
        TokenCodec::verify(self, token)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::Role;

    const SECRET: &str = "test-signing-secret-0123456789abcdef";

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig::with_secret(SECRET), RuntimeMode::Test)
    }

    fn claim() -> IdentityClaim {
        IdentityClaim::new("U1", "u1@example.com", Role::Wholesaler)
    }

    #[test]
    fn issue_then_verify_returns_claim() {
        let codec = codec();
        let token = codec.issue(&claim(), Duration::hours(1)).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.verify(&token).unwrap(), claim());
    }

    #[test]
    fn default_lifetime_comes_from_config() {
        let mut cfg = AuthConfig::with_secret(SECRET);
        cfg.token_lifetime = Duration::minutes(30);
        let codec = TokenCodec::new(&cfg, RuntimeMode::Test);
        let now = Utc::now();

        let token = codec.issue_default(&claim()).unwrap();
        assert!(codec.verify_at(&token, now + Duration::minutes(29)).is_ok());
        assert_eq!(
            codec.verify_at(&token, now + Duration::minutes(31)),
            Err(TokenError::Invalid(InvalidTokenError::Expired))
        );
    }

    #[test]
    fn negative_ttl_is_expired() {
        let codec = codec();
        let token = codec.issue(&claim(), Duration::seconds(-1)).unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Invalid(InvalidTokenError::Expired)));
    }

    #[test]
    fn out_of_range_lifetime_is_an_error() {
        let huge = Duration::seconds(100_000_000_000_000);
        assert_eq!(codec().issue(&claim(), huge), Err(TokenError::InvalidLifetime));

        let mut cfg = AuthConfig::with_secret(SECRET);
        cfg.token_lifetime = huge;
        let codec = TokenCodec::new(&cfg, RuntimeMode::Test);
        assert_eq!(codec.issue_default(&claim()), Err(TokenError::InvalidLifetime));
    }

    #[test]
    fn future_issued_at_is_accepted() {
        let codec = codec();
        let now = Utc::now();
        let token = codec.issue_at(&claim(), Duration::minutes(5), now + Duration::seconds(30)).unwrap();

        assert_eq!(codec.verify_at(&token, now).unwrap(), claim());
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = codec().issue(&claim(), Duration::hours(1)).unwrap();
        let other = TokenCodec::new(
            &AuthConfig::with_secret("another-signing-secret-0123456789ab"),
            RuntimeMode::Test,
        );

        assert_eq!(other.verify(&token), Err(TokenError::Invalid(InvalidTokenError::BadSignature)));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        for token in ["", "xyz", "a.b", "a.b.c", "....", "Bearer abc"] {
            assert!(
                matches!(codec.verify(token), Err(TokenError::Invalid(InvalidTokenError::Malformed(_)))),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn missing_secret_is_config_error() {
        let mut cfg = AuthConfig::with_secret(SECRET);
        cfg.secret = None;
        let codec = TokenCodec::new(&cfg, RuntimeMode::Development);

        assert!(!codec.is_configured());
        assert_eq!(
            codec.issue(&claim(), Duration::hours(1)),
            Err(TokenError::Config(ConfigError::Missing("JWT_SECRET")))
        );
        assert_eq!(
            codec.verify("a.b.c"),
            Err(TokenError::Config(ConfigError::Missing("JWT_SECRET")))
        );
    }

    #[test]
    fn weak_secret_only_fails_when_hardened() {
        let weak = AuthConfig::with_secret("short");

        let dev = TokenCodec::new(&weak, RuntimeMode::Development);
        let token = dev.issue(&claim(), Duration::hours(1)).unwrap();
        assert_eq!(dev.verify(&token).unwrap(), claim());

        let prod = TokenCodec::new(&weak, RuntimeMode::Production);
        assert!(matches!(
            prod.issue(&claim(), Duration::hours(1)),
            Err(TokenError::Config(ConfigError::WeakSecret { .. }))
        ));

        let placeholder = TokenCodec::new(&AuthConfig::with_secret("your-secret-key"), RuntimeMode::Production);
        assert_eq!(
            placeholder.issue(&claim(), Duration::hours(1)),
            Err(TokenError::Config(ConfigError::PlaceholderSecret))
        );
    }

    fn any_claim() -> impl Strategy<Value = IdentityClaim> {
        (
            "[A-Za-z0-9_-]{1,24}",
            "[a-z0-9.]{1,16}@[a-z]{1,10}\\.[a-z]{2,3}",
            prop::sample::select(Role::ALL.to_vec()),
        )
            .prop_map(|(id, email, role)| IdentityClaim::new(id, email, role))
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: any claim issued with a positive lifetime verifies back to itself.
        #[test]
        fn round_trip(claim in any_claim(), ttl_secs in 1i64..(30 * 24 * 3600)) {
            let codec = codec();
            let now = Utc::now();
            let token = codec.issue_at(&claim, Duration::seconds(ttl_secs), now).unwrap();

            prop_assert_eq!(codec.verify_at(&token, now).unwrap(), claim);
        }

        /// Property: changing any character of the signature segment breaks verification.
        #[test]
        fn tampered_signature_fails(claim in any_claim(), pos in any::<prop::sample::Index>(), replacement in "[A-Za-z0-9_-]") {
            let codec = codec();
            let token = codec.issue(&claim, Duration::hours(1)).unwrap();

            let sig_start = token.rfind('.').unwrap() + 1;
            let sig: Vec<char> = token[sig_start..].chars().collect();
            let idx = pos.index(sig.len());
            let new_char = replacement.chars().next().unwrap();
            prop_assume!(sig[idx] != new_char);

            let mut tampered: String = token[..sig_start].to_string();
            for (i, c) in sig.iter().enumerate() {
                tampered.push(if i == idx { new_char } else { *c });
            }

            prop_assert!(matches!(codec.verify(&tampered), Err(TokenError::Invalid(_))));
        }
    }
}
