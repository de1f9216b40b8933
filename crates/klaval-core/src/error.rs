//! Core error types for Klaval.
//!
//! The shared identifier and configuration types fail with `KlavalError`.
//! Session, scraping, storage and sync each carry their own error enum.

use thiserror::Error;

/// Errors raised by the core types.
#[derive(Error, Debug)]
pub enum KlavalError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors (invalid identifiers, constraints)
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `KlavalError`.
pub type Result<T> = std::result::Result<T, KlavalError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KlavalError::Validation("invalid racer ID".to_string());
        assert_eq!(err.to_string(), "validation error: invalid racer ID");

        let err = ConfigError::NoConfigDir;
        assert_eq!(
            err.to_string(),
            "could not determine config directory (XDG base directories not available)"
        );
    }

    #[test]
    fn test_error_from_config() {
        let config_err = ConfigError::InvalidValue {
            field: "site.base_url".to_string(),
            reason: "empty".to_string(),
        };
        let err: KlavalError = config_err.into();
        assert!(matches!(err, KlavalError::Config(_)));
        assert!(err.to_string().contains("site.base_url"));
    }
}
