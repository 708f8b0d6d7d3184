// SPDX-License-Identifier: MIT OR Apache-2.0

//! Portable environment variable expander.
//!
//! This module provides an [`EnvExpander`] that resolves `%NAME%` references from the process
//! environment, or from a fixed map for tests.

use crate::domain::value::{encode_wide, wide_len};
use crate::ports::EnvExpander;
use std::collections::HashMap;
use std::env;

/// Expands `%NAME%` references against the process environment.
///
/// Names are matched case-insensitively, against the fixed map and the process environment
/// alike; an exact match in the environment wins over a case-folded one. References to unknown
/// variables, and a `%` without a closing partner, are copied through unchanged.
///
/// # Examples
///
/// ```rust
/// use hexreg::adapters::ProcessEnvExpander;
/// use std::collections::HashMap;
///
/// let mut values = HashMap::new();
/// values.insert("ProgramData".to_string(), "C:\\ProgramData".to_string());
///
/// let expander = ProcessEnvExpander::with_values(values);
/// assert_eq!(
///     expander.expand_str("%PROGRAMDATA%\\App\\%UNKNOWN%"),
///     "C:\\ProgramData\\App\\%UNKNOWN%"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProcessEnvExpander {
    /// Fixed values that replace the process environment when set
    values: Option<HashMap<String, String>>,
}

impl ProcessEnvExpander {
    /// Creates an expander backed by the process environment.
    pub fn new() -> Self {
        Self { values: None }
    }

    /// Creates an expander backed by a fixed set of variables.
    ///
    /// **Note**: This is intended for tests, where touching the process environment would race
    /// with other tests.
    pub fn with_values(values: HashMap<String, String>) -> Self {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Self {
            values: Some(values),
        }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        match &self.values {
            Some(values) => values.get(&name.to_lowercase()).cloned(),
            None => env::var(name).ok().or_else(|| {
                env::vars_os().find_map(|(key, value)| {
                    key.to_str()
                        .filter(|key| key.eq_ignore_ascii_case(name))
                        .and(value.into_string().ok())
                })
            }),
        }
    }

    /// Expands every known `%NAME%` reference in `input`.
    pub fn expand_str(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find('%') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('%') else {
                out.push('%');
                rest = after;
                break;
            };
            let name = &after[..end];
            match self.lookup(name).filter(|_| !name.is_empty()) {
                Some(value) => {
                    out.push_str(&value);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('%');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl EnvExpander for ProcessEnvExpander {
    fn expand(&self, input: &[u16], output: &mut [u16]) -> u32 {
        let len = wide_len(input, input.len());
        let source = String::from_utf16_lossy(&input[..len]);
        let expanded = encode_wide(&self.expand_str(&source));
        let Ok(required) = u32::try_from(expanded.len()) else {
            return 0;
        };
        if expanded.len() <= output.len() {
            output[..expanded.len()].copy_from_slice(&expanded);
        }
        required
    }
}
