// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable option source adapter.
//!
//! This module provides an [`OptionsSource`] that reads resolver options from environment
//! variables such as `HEXREG_MAX_GROW_ATTEMPTS`.

use crate::domain::{OptionsOverlay, RegistryError, Result};
use crate::ports::OptionsSource;
use std::collections::HashMap;
use std::env;

/// Default prefix of the option variables.
pub const DEFAULT_PREFIX: &str = "HEXREG_";

const INITIAL_STRING_CHARS: &str = "INITIAL_STRING_CHARS";
const MAX_GROW_ATTEMPTS: &str = "MAX_GROW_ATTEMPTS";
const MAX_PATH_CHARS: &str = "MAX_PATH_CHARS";

/// Option source adapter for environment variables.
///
/// Recognizes `<PREFIX>INITIAL_STRING_CHARS`, `<PREFIX>MAX_GROW_ATTEMPTS` and
/// `<PREFIX>MAX_PATH_CHARS`. Unset variables leave the option untouched; a set variable that
/// is not a number is an error.
///
/// # Priority
///
/// Environment variables have a priority of 2, which overrides option files (priority 1).
///
/// # Examples
///
/// ```rust
/// use hexreg::adapters::EnvOptionsAdapter;
/// use hexreg::ports::OptionsSource;
/// use std::collections::HashMap;
///
/// let mut values = HashMap::new();
/// values.insert("HEXREG_MAX_PATH_CHARS".to_string(), "512".to_string());
///
/// let adapter = EnvOptionsAdapter::with_values(values);
/// assert_eq!(adapter.load().unwrap().max_path_chars, Some(512));
/// ```
#[derive(Debug, Clone)]
pub struct EnvOptionsAdapter {
    /// Prefix of the recognized variables
    prefix: String,
    /// Fixed values that replace the process environment when set
    values: Option<HashMap<String, String>>,
}

impl EnvOptionsAdapter {
    /// Creates an adapter reading `HEXREG_*` variables.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Creates an adapter reading variables with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            values: None,
        }
    }

    /// Creates an adapter with pre-populated values for testing.
    ///
    /// **Note**: This method is primarily intended for testing; the keys must include the
    /// default prefix.
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            values: Some(values),
        }
    }

    fn var(&self, suffix: &str) -> Option<String> {
        let name = format!("{}{}", self.prefix, suffix);
        match &self.values {
            Some(values) => values.get(&name).cloned(),
            None => env::var(&name).ok(),
        }
    }

    fn number(&self, suffix: &str) -> Result<Option<usize>> {
        let Some(raw) = self.var(suffix) else {
            return Ok(None);
        };
        raw.trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| RegistryError::OptionsError {
                message: format!("{}{} is not a number: {}", self.prefix, suffix, raw),
                source: Some(Box::new(e)),
            })
    }
}

impl Default for EnvOptionsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsSource for EnvOptionsAdapter {
    fn name(&self) -> &str {
        "env"
    }

    fn priority(&self) -> u8 {
        2
    }

    fn load(&self) -> Result<OptionsOverlay> {
        Ok(OptionsOverlay {
            initial_string_chars: self.number(INITIAL_STRING_CHARS)?,
            max_grow_attempts: self.number(MAX_GROW_ATTEMPTS)?,
            max_path_chars: self.number(MAX_PATH_CHARS)?,
        })
    }
}
