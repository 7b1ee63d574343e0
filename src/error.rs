//! Error types for Keyseek
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for Keyseek
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Sort Key Errors
    // ============================================================================
    #[error("Sort key is not defined")]
    SortKeyUndefined,

    #[error("Sort key '{name}' is not registered")]
    SortKeyNotFound { name: String },

    // ============================================================================
    // Cursor Errors
    // ============================================================================
    #[error("Invalid cursor: {message}")]
    InvalidCursor { message: String },

    // ============================================================================
    // Limit Errors
    // ============================================================================
    #[error("Limit must be positive, got {limit}")]
    NegativeLimit { limit: i64 },

    #[error("Limit {limit} is greater than max {max}")]
    LimitExceedsMax { limit: i64, max: i64 },

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
    // Global ID Errors
    // ============================================================================
    #[error("Invalid global id: {message}")]
    GlobalId { message: String },

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

    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}

impl Error {
    /// Create a sort-key-not-found error
    pub fn sort_key_not_found(name: impl Into<String>) -> Self {
        Self::SortKeyNotFound { name: name.into() }
    }

    /// Create an invalid cursor error
    pub fn invalid_cursor(message: impl Into<String>) -> Self {
        Self::InvalidCursor {
            message: message.into(),
        }
    }

    /// Create a negative limit error
    pub fn negative_limit(limit: i64) -> Self {
        Self::NegativeLimit { limit }
    }

    /// Create a limit-exceeds-max error
    pub fn limit_exceeds_max(limit: i64, max: i64) -> Self {
        Self::LimitExceedsMax { limit, max }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a global id error
    pub fn global_id(message: impl Into<String>) -> Self {
        Self::GlobalId {
            message: message.into(),
        }
    }

    /// Create a file-not-found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Check if this error was raised during request validation,
    /// before any query was dispatched
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::SortKeyUndefined
                | Error::SortKeyNotFound { .. }
                | Error::InvalidCursor { .. }
                | Error::NegativeLimit { .. }
                | Error::LimitExceedsMax { .. }
        )
    }
}

/// Result type alias for Keyseek
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
        let err = Error::SortKeyUndefined;
        assert_eq!(err.to_string(), "Sort key is not defined");

        let err = Error::sort_key_not_found("recent");
        assert_eq!(err.to_string(), "Sort key 'recent' is not registered");

        let err = Error::invalid_cursor("arity mismatch");
        assert_eq!(err.to_string(), "Invalid cursor: arity mismatch");

        let err = Error::negative_limit(-1);
        assert_eq!(err.to_string(), "Limit must be positive, got -1");

        let err = Error::limit_exceeds_max(101, 100);
        assert_eq!(err.to_string(), "Limit 101 is greater than max 100");
    }

    #[test]
    fn test_is_validation() {
        assert!(Error::SortKeyUndefined.is_validation());
        assert!(Error::sort_key_not_found("x").is_validation());
        assert!(Error::invalid_cursor("bad").is_validation());
        assert!(Error::negative_limit(-5).is_validation());
        assert!(Error::limit_exceeds_max(200, 100).is_validation());

        assert!(!Error::config("test").is_validation());
        assert!(!Error::Other("test".to_string()).is_validation());
    }

    #[test]
    fn test_execution_errors_stay_transparent() {
        let inner = anyhow::anyhow!("database is on fire");
        let err: Error = inner.into();
        assert_eq!(err.to_string(), "database is on fire");
        assert!(!err.is_validation());
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
