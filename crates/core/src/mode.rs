use core::str::FromStr;

use crate::ConfigError;

/// Runtime posture of the process.
///
/// `Production` is the hardened mode: configuration defects are fatal and
/// `Strict-Transport-Security` is emitted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum RuntimeMode {
    #[default]
    Development,
    Test,
    Production,
}

impl RuntimeMode {
    pub fn is_hardened(self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl core::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::invalid(
                "APP_ENV",
                format!("unknown mode '{other}' (expected production, development or test)"),
            )),
        }
    }
}
