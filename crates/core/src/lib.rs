//! `mercato-core`: process configuration and startup policy.
//!
//! Everything here is read once at process start and then shared immutably.
//! Request-handling code never consults the environment directly.

pub mod config;
pub mod error;
pub mod guard;
pub mod mode;

pub use config::{
    AppConfig, AuthConfig, CorsConfig, DEFAULT_CORS_ORIGINS, DEFAULT_DEV_BYPASS_SUBJECT, MAX_TOKEN_LIFETIME_SECS,
    parse_lifetime,
};
pub use error::{ConfigError, ConfigResult};
pub use guard::{ConfigWarning, MIN_SECRET_LEN, check, check_secret};
pub use mode::RuntimeMode;
