// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the registry resolver.
//!
//! This module defines the error types that can occur when opening keys and reading values
//! from a hierarchical store. All errors use `thiserror` for proper error handling and conversion.

use std::collections::TryReserveError;
use std::time::Duration;
use thiserror::Error;

/// The main error type for resolver operations.
///
/// Only [`RegistryError::NotFound`] is treated as recoverable by the waiting operations;
/// every other variant aborts a wait immediately. The enum is marked `#[non_exhaustive]`
/// to allow for future additions without breaking backwards compatibility.
///
/// # Examples
///
/// ```
/// use hexreg::domain::errors::RegistryError;
///
/// fn read_port() -> Result<u32, RegistryError> {
///     Err(RegistryError::NotFound {
///         what: "Parameters\\Port".to_string(),
///     })
/// }
///
/// assert!(read_port().unwrap_err().is_not_found());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// A key segment or a value does not exist (yet).
    #[error("Registry entry not found: {what}")]
    NotFound {
        /// The key path or value name that was not found
        what: String,
    },

    /// The deadline elapsed while waiting for an entry to appear.
    #[error("Timed out after {waited:?} waiting for {what}")]
    Timeout {
        /// The key path or value name being waited for
        what: String,
        /// The timeout budget that was exhausted
        waited: Duration,
    },

    /// The value exists but has an unexpected type or size.
    #[error("Registry value '{name}' has unexpected type or size: {message}")]
    TypeMismatch {
        /// The value name
        name: String,
        /// What was expected and what was found
        message: String,
    },

    /// A buffer could not be grown to the requested size.
    #[error("Failed to allocate {requested} elements")]
    AllocationFailure {
        /// The number of elements that were requested
        requested: usize,
        /// The underlying allocation error
        #[source]
        source: TryReserveError,
    },

    /// A key path exceeds the configured maximum length.
    #[error("Registry path too long ({len} chars, max {max}): {path}")]
    PathTooLong {
        /// The rejected path
        path: String,
        /// Its length in UTF-16 code units
        len: usize,
        /// The configured maximum
        max: usize,
    },

    /// A grow-until-fits loop did not converge within the configured number of attempts.
    #[error("{operation} did not converge after {attempts} attempts")]
    RetryLimitExceeded {
        /// The loop that gave up
        operation: &'static str,
        /// How many attempts were made
        attempts: usize,
    },

    /// Environment variable expansion failed.
    #[error("Failed to expand environment variables in: {input}")]
    ExpansionFailed {
        /// The unexpanded input
        input: String,
    },

    /// Any other failure reported by the underlying store.
    #[error("Registry store '{store}' error: {message}")]
    StoreError {
        /// The name of the store that failed
        store: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Resolver options could not be loaded or parsed.
    #[error("Failed to load resolver options: {message}")]
    OptionsError {
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An I/O error occurred while reading options.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RegistryError {
    /// Returns true for the not-found class, the only class a waiting operation retries.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }

    /// Returns true if this error reports an elapsed deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RegistryError::Timeout { .. })
    }

    /// Creates a `StoreError` without an underlying cause.
    pub fn store(store: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::StoreError {
            store: store.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates an `AllocationFailure` from a failed reservation.
    pub fn from_try_reserve(requested: usize, err: TryReserveError) -> Self {
        RegistryError::AllocationFailure {
            requested,
            source: err,
        }
    }
}

/// A specialized Result type for resolver operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = RegistryError::NotFound {
            what: "Software\\App".to_string(),
        };
        assert_eq!(error.to_string(), "Registry entry not found: Software\\App");
        assert!(error.is_not_found());
        assert!(!error.is_timeout());
    }

    #[test]
    fn test_timeout_is_not_not_found() {
        let error = RegistryError::Timeout {
            what: "Software\\App".to_string(),
            waited: Duration::from_millis(500),
        };
        assert!(error.is_timeout());
        assert!(!error.is_not_found());
        assert!(error.to_string().contains("500ms"));
    }

    #[test]
    fn test_type_mismatch_error() {
        let error = RegistryError::TypeMismatch {
            name: "Port".to_string(),
            message: "expected 4 bytes, found 2".to_string(),
        };
        assert!(error.to_string().contains("Port"));
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_store_error() {
        let error = RegistryError::store("memory", "access denied");
        assert_eq!(
            error.to_string(),
            "Registry store 'memory' error: access denied"
        );
    }

    #[test]
    fn test_allocation_failure_from_try_reserve() {
        let mut v: Vec<u8> = Vec::new();
        let err = v.try_reserve_exact(usize::MAX).unwrap_err();
        let error = RegistryError::from_try_reserve(usize::MAX, err);
        assert!(matches!(error, RegistryError::AllocationFailure { .. }));
    }

    #[test]
    fn test_path_too_long_error() {
        let error = RegistryError::PathTooLong {
            path: "A\\B".to_string(),
            len: 3,
            max: 2,
        };
        assert!(error.to_string().contains("max 2"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = RegistryError::from(io_error);
        assert!(matches!(error, RegistryError::IoError(_)));
        assert!(!error.is_not_found());
    }
}
