//! Environment policy guard.
//!
//! Runs once before the process serves traffic. In hardened mode the first
//! defect aborts startup; elsewhere defects come back as warnings so local
//! development is not blocked.

use crate::{AppConfig, ConfigError, ConfigResult};

/// Minimum signing secret length accepted in hardened mode.
pub const MIN_SECRET_LEN: usize = 32;

/// Secrets that ship in templates and tutorials.
pub const PLACEHOLDER_SECRETS: &[&str] = &[
    "secret",
    "changeme",
    "change-me",
    "dev-secret",
    "test-secret",
    "your-secret-key",
    "your_jwt_secret",
    "your-jwt-secret",
    "your_jwt_secret_key_here",
    "your-super-secret-jwt-key-change-this-in-production",
];

/// A defect that was tolerated because the process is not hardened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub error: Option<ConfigError>,
    pub message: String,
}

impl ConfigWarning {
    fn from_error(error: ConfigError) -> Self {
        Self {
            message: error.to_string(),
            error: Some(error),
        }
    }

    fn note(message: impl Into<String>) -> Self {
        Self {
            error: None,
            message: message.into(),
        }
    }
}

impl core::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Check a signing secret against the strength bar.
pub fn check_secret(secret: &str) -> ConfigResult<()> {
    let normalized = secret.trim().to_ascii_lowercase();
    if PLACEHOLDER_SECRETS.contains(&normalized.as_str()) {
        return Err(ConfigError::PlaceholderSecret);
    }
    let actual = secret.chars().count();
    if actual < MIN_SECRET_LEN {
        return Err(ConfigError::WeakSecret {
            min: MIN_SECRET_LEN,
            actual,
        });
    }
    Ok(())
}

/// Check the shape of a document store connection string.
pub fn check_storage_url(url: &str) -> ConfigResult<()> {
    let rest = url
        .strip_prefix("mongodb+srv://")
        .or_else(|| url.strip_prefix("mongodb://"))
        .ok_or_else(|| ConfigError::invalid("MONGODB_URI", "expected a mongodb:// or mongodb+srv:// url"))?;

    // Credentials are optional; the host part must not be empty.
    let authority = rest.split(['/', '?']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    if host.is_empty() {
        return Err(ConfigError::invalid("MONGODB_URI", "missing host"));
    }
    Ok(())
}

/// Validate configuration for the configured mode.
///
/// Returns the tolerated defects on success. In hardened mode any defect is
/// returned as an error instead.
pub fn check(config: &AppConfig) -> ConfigResult<Vec<ConfigWarning>> {
    let hardened = config.mode.is_hardened();
    let mut warnings = Vec::new();

    let mut tolerate = |result: ConfigResult<()>| -> ConfigResult<()> {
        match result {
            Err(e) if hardened => Err(e),
            Err(e) => {
                warnings.push(ConfigWarning::from_error(e));
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    };

    for defect in &config.deferred {
        tolerate(Err(defect.clone()))?;
    }

    tolerate(match config.auth.secret.as_deref() {
        Some(secret) => check_secret(secret),
        None => Err(ConfigError::Missing("JWT_SECRET")),
    })?;

    tolerate(match config.storage_url.as_deref() {
        Some(url) => check_storage_url(url),
        None => Err(ConfigError::Missing("MONGODB_URI")),
    })?;

    if hardened && !config.auth.bypass_subjects.is_empty() {
        warnings.push(ConfigWarning::note(format!(
            "{} bypass subject(s) are treated as admin in production",
            config.auth.bypass_subjects.len()
        )));
    }

    Ok(warnings)
}
