// SPDX-License-Identifier: MIT OR Apache-2.0

//! Option source trait definition.
//!
//! This module defines the `OptionsSource` trait, the port for loading resolver options from
//! files, the environment or anything else. Sources are layered by priority.

use crate::domain::{OptionsOverlay, Result};

/// A source of resolver option overrides.
///
/// # Priority
///
/// Overlays are applied lowest priority first, so higher values win. The bundled sources use:
///
/// - **2**: Environment variables
/// - **1**: Option files
///
/// # Examples
///
/// ```rust
/// use hexreg::ports::OptionsSource;
/// use hexreg::domain::{OptionsOverlay, Result};
///
/// struct Fixed;
///
/// impl OptionsSource for Fixed {
///     fn name(&self) -> &str {
///         "fixed"
///     }
///
///     fn priority(&self) -> u8 {
///         1
///     }
///
///     fn load(&self) -> Result<OptionsOverlay> {
///         Ok(OptionsOverlay {
///             max_grow_attempts: Some(4),
///             ..Default::default()
///         })
///     }
/// }
///
/// assert_eq!(Fixed.load().unwrap().max_grow_attempts, Some(4));
/// ```
pub trait OptionsSource: Send + Sync {
    /// Returns the name of this source for logs and errors.
    fn name(&self) -> &str;

    /// Returns the priority of this source; higher values override lower ones.
    fn priority(&self) -> u8;

    /// Loads the overrides this source provides.
    fn load(&self) -> Result<OptionsOverlay>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestSource {
        name: String,
        priority: u8,
    }

    impl OptionsSource for TestSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        fn load(&self) -> Result<OptionsOverlay> {
            Ok(OptionsOverlay::default())
        }
    }

    #[test]
    fn test_options_source_name_and_priority() {
        let source = TestSource {
            name: "test-source".to_string(),
            priority: 2,
        };
        assert_eq!(source.name(), "test-source");
        assert_eq!(source.priority(), 2);
        assert!(source.load().unwrap().is_empty());
    }

    #[test]
    fn test_options_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn OptionsSource>>();
    }
}
