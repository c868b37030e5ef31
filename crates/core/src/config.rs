//! Immutable process configuration.
//!
//! Built once from an environment-like source and then passed by reference
//! (or behind an `Arc`) to the token codec, the access policy and the
//! response hardening layer.

use chrono::Duration;

use crate::{ConfigError, ConfigResult, RuntimeMode};

/// Origins allowed for CORS when `CORS_ORIGINS` is not set.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:5173"];

/// Subject treated as admin-equivalent outside production unless overridden.
pub const DEFAULT_DEV_BYPASS_SUBJECT: &str = "dev-user-123";

const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

/// Longest accepted `JWT_EXPIRES_IN` (ten years).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Token signing settings.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// HMAC signing secret. `None` when `JWT_SECRET` is unset.
    pub secret: Option<String>,

    /// Lifetime applied to newly issued tokens.
    pub token_lifetime: Duration,

    /// Subjects treated as admin-equivalent regardless of their role.
    pub bypass_subjects: Vec<String>,
}

// Hand-written so the secret never reaches a log line.
impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("token_lifetime", &self.token_lifetime)
            .field("bypass_subjects", &self.bypass_subjects)
            .finish()
    }
}

impl AuthConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            token_lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
            bypass_subjects: Vec::new(),
        }
    }
}

/// Cross-origin settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// Complete process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub mode: RuntimeMode,
    pub auth: AuthConfig,
    /// Document store connection string (`MONGODB_URI`).
    pub storage_url: Option<String>,
    pub cors: CorsConfig,
    pub bind_addr: String,
    /// Settings that could not be parsed and fell back to their default.
    /// The guard decides whether they are fatal.
    pub deferred: Vec<ConfigError>,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Read configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset. An unknown `APP_ENV` fails here;
    /// other unparseable values are recorded in `deferred`.
    pub fn from_source<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mode = match get("APP_ENV") {
            Some(raw) => raw.parse()?,
            None => RuntimeMode::default(),
        };

        let mut deferred = Vec::new();

        let token_lifetime = get("JWT_EXPIRES_IN")
            .map(|raw| parse_lifetime(&raw))
            .transpose()
            .unwrap_or_else(|e| {
                deferred.push(e);
                None
            })
            .unwrap_or_else(|| Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS));

        let bypass_subjects = match get("AUTH_BYPASS_SUBJECTS") {
            Some(raw) => split_list(&raw),
            None if mode.is_hardened() => Vec::new(),
            None => vec![DEFAULT_DEV_BYPASS_SUBJECT.to_string()],
        };

        let cors = match get("CORS_ORIGINS") {
            Some(raw) => CorsConfig {
                allowed_origins: split_list(&raw),
            },
            None => CorsConfig::default(),
        };

        Ok(Self {
            mode,
            auth: AuthConfig {
                // Secrets are taken verbatim; only emptiness counts as unset.
                secret: lookup("JWT_SECRET").filter(|s| !s.is_empty()),
                token_lifetime,
                bypass_subjects,
            },
            storage_url: get("MONGODB_URI"),
            cors,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            deferred,
        })
    }
}

/// Parse a token lifetime such as `7d`, `12h`, `30m`, `45s` or `3600`.
pub fn parse_lifetime(raw: &str) -> ConfigResult<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], c.to_ascii_lowercase()),
        _ => (raw, 's'),
    };

    let value: i64 = digits
        .parse()
        .map_err(|_| ConfigError::invalid("JWT_EXPIRES_IN", format!("'{raw}' is not a duration")))?;
    if value <= 0 {
        return Err(ConfigError::invalid("JWT_EXPIRES_IN", "lifetime must be positive"));
    }

    let secs = match unit {
        's' => Some(value),
        'm' => value.checked_mul(60),
        'h' => value.checked_mul(60 * 60),
        'd' => value.checked_mul(24 * 60 * 60),
        other => {
            return Err(ConfigError::invalid(
                "JWT_EXPIRES_IN",
                format!("unknown unit '{other}' (expected s, m, h or d)"),
            ));
        }
    };

    secs.filter(|&secs| secs <= MAX_TOKEN_LIFETIME_SECS)
        .and_then(Duration::try_seconds)
        .ok_or_else(|| ConfigError::invalid("JWT_EXPIRES_IN", "lifetime exceeds ten years"))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
