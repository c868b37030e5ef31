//! Configuration error model.

use thiserror::Error;

/// Result type used by configuration loading and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A configuration defect.
///
/// In hardened mode every variant is fatal at startup. Outside hardened mode
/// the guard downgrades most of them to warnings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// The signing secret is shorter than the minimum length.
    #[error("signing secret must be at least {min} characters (got {actual})")]
    WeakSecret { min: usize, actual: usize },

    /// The signing secret is a well-known placeholder value.
    #[error("signing secret is a well-known placeholder")]
    PlaceholderSecret,

    /// A setting is present but cannot be interpreted.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}
