//! Unified error handling for Vigil
//!
//! This module provides a centralized error type for the console, ensuring
//! consistent error handling across the client, coordinator and config layers.

use thiserror::Error;

/// Main error type for Vigil operations
#[derive(Debug, Error)]
pub enum VigilError {
    /// I/O related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP failures (connect, DNS, broken body)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success responses from the portal API
    #[error("API error: status {status}: {message}")]
    Api { status: u16, message: String },

    /// Malformed response bodies
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration parsing or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Convenience type alias for Results using VigilError
pub type VigilResult<T> = Result<T, VigilError>;

// Implement conversions from common error types
impl From<reqwest::Error> for VigilError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VigilError::Timeout(err.to_string())
        } else if err.is_decode() {
            VigilError::Parse(err.to_string())
        } else {
            VigilError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for VigilError {
    fn from(err: serde_json::Error) -> Self {
        VigilError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for VigilError {
    fn from(err: toml::de::Error) -> Self {
        VigilError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for VigilError {
    fn from(err: toml::ser::Error) -> Self {
        VigilError::Config(format!("TOML serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = VigilError::Api {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "API error: status 503: maintenance");
    }

    #[test]
    fn test_json_error_maps_to_parse() {
        let err: VigilError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, VigilError::Parse(_)));
    }
}
