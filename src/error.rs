//! Error types for series-pager
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Every variant keeps the field, value or cursor that caused it so a client
//! can correct its request without any server-side state.

use thiserror::Error;

/// The main error type for series-pager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Request Errors (client side)
    // ============================================================================
    #[error("Malformed page cursor '{cursor}': {reason}")]
    MalformedCursor { cursor: String, reason: String },

    #[error("Ambiguous timezone for '{field}' ({value}): a time containing only an offset needs a named timezone, supply the 'timezone' parameter")]
    AmbiguousTimezone { field: String, value: String },

    #[error("Invalid date-time for '{field}': {value}")]
    InvalidTimestamp { field: String, value: String },

    #[error("Unknown timezone: {zone}")]
    UnknownTimezone { zone: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidParameter { field: String, message: String },

    #[error("Cannot create catalog of requested information: unknown dataset '{dataset}'")]
    UnknownDataset { dataset: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Cannot convert units from '{from}' to '{to}'")]
    UnitConversion { from: String, to: String },

    // ============================================================================
    // Data Source Errors
    // ============================================================================
    #[error("Data source query failed: {message}")]
    UpstreamQuery { message: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a malformed cursor error
    pub fn malformed_cursor(cursor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCursor {
            cursor: cursor.into(),
            reason: reason.into(),
        }
    }

    /// Create an ambiguous timezone error
    pub fn ambiguous_timezone(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AmbiguousTimezone {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an invalid timestamp error
    pub fn invalid_timestamp(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an unknown timezone error
    pub fn unknown_timezone(zone: impl Into<String>) -> Self {
        Self::UnknownTimezone { zone: zone.into() }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a unit conversion error
    pub fn unit_conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::UnitConversion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create an upstream query error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamQuery {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error was caused by the request rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedCursor { .. }
                | Error::AmbiguousTimezone { .. }
                | Error::InvalidTimestamp { .. }
                | Error::UnknownTimezone { .. }
                | Error::InvalidParameter { .. }
                | Error::UnknownDataset { .. }
                | Error::NotFound { .. }
                | Error::UnitConversion { .. }
        )
    }

    /// HTTP status code used when this error reaches the boundary layer
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            e if e.is_client_error() => 400,
            _ => 500,
        }
    }
}

/// Result type alias for series-pager
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::malformed_cursor("abc", "not valid base64");
        assert_eq!(
            err.to_string(),
            "Malformed page cursor 'abc': not valid base64"
        );

        let err = Error::invalid_parameter("page-size", "must not be negative");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'page-size': must not be negative"
        );

        let err = Error::upstream("connection reset");
        assert_eq!(err.to_string(), "Data source query failed: connection reset");
    }

    #[test]
    fn test_ambiguous_timezone_names_field_and_value() {
        let err = Error::ambiguous_timezone("begin", "2024-01-01T00:00:00-06:00");
        let msg = err.to_string();
        assert!(msg.contains("begin"));
        assert!(msg.contains("2024-01-01T00:00:00-06:00"));
        assert!(msg.contains("timezone"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::malformed_cursor("x", "y").status_code(), 400);
        assert_eq!(Error::ambiguous_timezone("begin", "x").status_code(), 400);
        assert_eq!(Error::unknown_timezone("Mars/Base").status_code(), 400);
        assert_eq!(Error::not_found("series").status_code(), 404);
        assert_eq!(Error::upstream("boom").status_code(), 500);
        assert_eq!(Error::config("bad").status_code(), 500);
    }

    #[test]
    fn test_is_client_error() {
        assert!(Error::unit_conversion("ft", "cfs").is_client_error());
        assert!(Error::UnknownDataset {
            dataset: "ratings".into()
        }
        .is_client_error());
        assert!(!Error::upstream("timeout").is_client_error());
        assert!(!Error::Other("x".into()).is_client_error());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
