//! Error types for directory management operations.
//!
//! Every failure surfaced by the LDAP adapter or the CLI is one of these variants. Payloads are
//! plain strings so the error stays `Clone` and comparable in tests.

use thiserror::Error;

/// Main error type for directory management operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The directory server could not be reached
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Operation timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Entry not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (bad names, rejected credentials, malformed input)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Conflicting directory state (name taken, duplicate entries, concurrent update)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Local I/O failure (key files, LDIF dumps)
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed data received from the directory or read from disk
    #[error("Parse error: {0}")]
    ParseError(String),

    /// External service error
    #[error("External service error: {service}: {message}")]
    ExternalServiceError {
        /// Service name that failed
        service: String,
        /// Error message
        message: String,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Specialized result type for directory management operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Io(_) => "IO_ERROR",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::ExternalServiceError { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::InternalError(_)
                | Self::ConfigError(_)
                | Self::ServiceUnavailable(_)
                | Self::ExternalServiceError { .. }
        )
    }

    /// Builds an [`Error::ExternalServiceError`] for the LDAP server.
    #[must_use]
    pub fn ldap(message: impl Into<String>) -> Self {
        Self::ExternalServiceError {
            service: "ldap".to_string(),
            message: message.into(),
        }
    }
}

// Conversions from external error types
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("invalid LDAP URL: {err}"))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::ServiceUnavailable("test".to_string()).error_code(),
            "SERVICE_UNAVAILABLE"
        );
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(Error::Timeout("test".to_string()).error_code(), "TIMEOUT");
        assert_eq!(
            Error::NotFound("test".to_string()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            Error::InvalidRequest("test".to_string()).error_code(),
            "INVALID_REQUEST"
        );
        assert_eq!(Error::Conflict("test".to_string()).error_code(), "CONFLICT");
        assert_eq!(Error::Io("test".to_string()).error_code(), "IO_ERROR");
        assert_eq!(Error::ldap("down").error_code(), "EXTERNAL_SERVICE_ERROR");
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");

        let err = Error::ldap("connection reset");
        assert_eq!(
            err.to_string(),
            "External service error: ldap: connection reset"
        );
    }

    #[test]
    fn test_should_log() {
        assert!(Error::InternalError("test".to_string()).should_log());
        assert!(Error::ConfigError("test".to_string()).should_log());
        assert!(Error::ServiceUnavailable("test".to_string()).should_log());
        assert!(Error::ldap("msg").should_log());

        assert!(!Error::NotFound("test".to_string()).should_log());
        assert!(!Error::Conflict("test".to_string()).should_log());
    }

    #[test]
    fn test_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let converted: Error = err.into();
        assert!(matches!(converted, Error::Io(_)));
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let converted: Error = err.into();
        assert!(matches!(converted, Error::ConfigError(_)));
    }

    #[test]
    fn test_from_toml_error() {
        let err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let converted: Error = err.into();
        assert_eq!(converted.error_code(), "CONFIG_ERROR");
    }
}
