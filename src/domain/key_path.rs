// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key path newtype for type-safe, non-destructive path handling.
//!
//! This module provides the `KeyPath` type, a newtype wrapper around `String` that names a key
//! relative to a root key and splits into its segments without touching the caller's buffer.

use std::fmt;

/// The delimiter between key path segments.
pub const SEGMENT_DELIMITER: char = '\\';

/// A key path relative to a root key, such as `SOFTWARE\Vendor\App`.
///
/// The path is split into an immutable segment list up front; resolution walks that list by
/// index, so the original string is never modified.
///
/// # Examples
///
/// ```
/// use hexreg::domain::key_path::KeyPath;
///
/// let path = KeyPath::from("SOFTWARE\\Vendor\\App");
/// assert_eq!(path.segments(), vec!["SOFTWARE", "Vendor", "App"]);
/// assert_eq!(path.as_str(), "SOFTWARE\\Vendor\\App");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyPath(String);

impl KeyPath {
    /// Creates a new `KeyPath` from a `String`.
    pub fn new(path: String) -> Self {
        KeyPath(path)
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the path names the root key itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use hexreg::domain::key_path::KeyPath;
    ///
    /// assert!(KeyPath::from("").is_root());
    /// assert!(!KeyPath::from("SOFTWARE").is_root());
    /// ```
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Splits the path into its segments.
    ///
    /// An empty path has no segments. Empty segments between consecutive delimiters are
    /// preserved; opening an empty segment opens the parent key again.
    ///
    /// # Examples
    ///
    /// ```
    /// use hexreg::domain::key_path::KeyPath;
    ///
    /// assert!(KeyPath::from("").segments().is_empty());
    /// assert_eq!(KeyPath::from("A").segments(), vec!["A"]);
    /// assert_eq!(KeyPath::from("A\\\\B").segments(), vec!["A", "", "B"]);
    /// ```
    pub fn segments(&self) -> Vec<&str> {
        if self.0.is_empty() {
            return Vec::new();
        }
        self.0.split(SEGMENT_DELIMITER).collect()
    }

    /// Returns the length of the path in UTF-16 code units, the unit stores measure paths in.
    pub fn len_utf16(&self) -> usize {
        self.0.encode_utf16().count()
    }

    /// Converts the `KeyPath` into its inner `String`.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for KeyPath {
    fn from(s: String) -> Self {
        KeyPath(s)
    }
}

impl From<&str> for KeyPath {
    fn from(s: &str) -> Self {
        KeyPath(s.to_string())
    }
}

impl From<KeyPath> for String {
    fn from(path: KeyPath) -> Self {
        path.0
    }
}

impl AsRef<str> for KeyPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_path_segments() {
        let path = KeyPath::from("A\\B\\C");
        assert_eq!(path.segments(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_key_path_single_segment() {
        let path = KeyPath::from("Services");
        assert_eq!(path.segments(), vec!["Services"]);
    }

    #[test]
    fn test_key_path_empty_is_root() {
        let path = KeyPath::from("");
        assert!(path.is_root());
        assert!(path.segments().is_empty());
    }

    #[test]
    fn test_key_path_trailing_delimiter() {
        let path = KeyPath::from("A\\");
        assert_eq!(path.segments(), vec!["A", ""]);
    }

    #[test]
    fn test_key_path_split_leaves_original_intact() {
        let path = KeyPath::from("A\\B");
        let _ = path.segments();
        assert_eq!(path.as_str(), "A\\B");
    }

    #[test]
    fn test_key_path_len_utf16() {
        assert_eq!(KeyPath::from("abc").len_utf16(), 3);
        assert_eq!(KeyPath::from("\u{1F600}").len_utf16(), 2);
    }

    #[test]
    fn test_key_path_display() {
        let path = KeyPath::from("A\\B");
        assert_eq!(format!("{}", path), "A\\B");
    }

    #[test]
    fn test_string_from_key_path() {
        let s: String = KeyPath::from("A").into();
        assert_eq!(s, "A");
        assert_eq!(KeyPath::new("B".to_string()).into_string(), "B");
    }
}
