// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tunable resolver options and partial overlays loaded from option sources.

use serde::{Deserialize, Serialize};

/// Default initial guess, in UTF-16 code units, for string reads.
pub const DEFAULT_INITIAL_STRING_CHARS: usize = 256;

/// Default cap on grow-until-fits iterations.
pub const DEFAULT_MAX_GROW_ATTEMPTS: usize = 16;

/// Default maximum key path length, in UTF-16 code units.
pub const DEFAULT_MAX_PATH_CHARS: usize = 256;

/// Options controlling buffer sizing and the hardening limits of the resolver.
///
/// # Examples
///
/// ```
/// use hexreg::domain::ResolverOptions;
///
/// let options = ResolverOptions::default();
/// assert_eq!(options.initial_string_chars, 256);
/// assert_eq!(options.max_grow_attempts, 16);
/// assert_eq!(options.max_path_chars, 256);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Initial buffer size, in code units, for string and multi-string reads.
    pub initial_string_chars: usize,
    /// Maximum number of attempts for the read and expansion grow loops.
    pub max_grow_attempts: usize,
    /// Paths of this many code units or more are rejected before any store call.
    pub max_path_chars: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            initial_string_chars: DEFAULT_INITIAL_STRING_CHARS,
            max_grow_attempts: DEFAULT_MAX_GROW_ATTEMPTS,
            max_path_chars: DEFAULT_MAX_PATH_CHARS,
        }
    }
}

impl ResolverOptions {
    /// Sets the initial string buffer size.
    pub fn initial_string_chars(mut self, chars: usize) -> Self {
        self.initial_string_chars = chars;
        self
    }

    /// Sets the grow loop attempt cap.
    pub fn max_grow_attempts(mut self, attempts: usize) -> Self {
        self.max_grow_attempts = attempts;
        self
    }

    /// Sets the maximum path length.
    pub fn max_path_chars(mut self, chars: usize) -> Self {
        self.max_path_chars = chars;
        self
    }

    /// Applies every field present in `overlay` on top of these options.
    pub fn apply(&mut self, overlay: &OptionsOverlay) {
        if let Some(chars) = overlay.initial_string_chars {
            self.initial_string_chars = chars;
        }
        if let Some(attempts) = overlay.max_grow_attempts {
            self.max_grow_attempts = attempts;
        }
        if let Some(chars) = overlay.max_path_chars {
            self.max_path_chars = chars;
        }
    }
}

/// A partial set of options, as provided by a single option source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsOverlay {
    /// Overrides [`ResolverOptions::initial_string_chars`].
    pub initial_string_chars: Option<usize>,
    /// Overrides [`ResolverOptions::max_grow_attempts`].
    pub max_grow_attempts: Option<usize>,
    /// Overrides [`ResolverOptions::max_path_chars`].
    pub max_path_chars: Option<usize>,
}

impl OptionsOverlay {
    /// Returns true if the overlay sets no field.
    pub fn is_empty(&self) -> bool {
        self == &OptionsOverlay::default()
    }
}
