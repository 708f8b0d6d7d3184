// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed value blobs and decoding helpers.
//!
//! This module provides `ValueType`, the declared type tag of a stored value, and `RawValue`,
//! the bytes returned by a single read together with that tag. String-shaped values are
//! UTF-16LE on the wire; helpers here convert them to code units and to Rust strings.

use std::fmt;

/// The declared type of a stored value.
///
/// The numeric tags match the Windows registry value types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// No declared type.
    None,
    /// A single terminated string.
    String,
    /// A string with embedded `%NAME%` environment variable references.
    ExpandString,
    /// Arbitrary bytes.
    Binary,
    /// A little-endian 32-bit integer.
    Dword,
    /// A big-endian 32-bit integer.
    DwordBigEndian,
    /// A symbolic link target.
    Link,
    /// A list of terminated strings followed by a list terminator.
    MultiString,
    /// A little-endian 64-bit integer.
    Qword,
    /// Any other tag.
    Other(u32),
}

impl ValueType {
    /// Creates a `ValueType` from its numeric tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use hexreg::domain::ValueType;
    ///
    /// assert_eq!(ValueType::from_raw(4), ValueType::Dword);
    /// assert_eq!(ValueType::from_raw(7), ValueType::MultiString);
    /// assert_eq!(ValueType::from_raw(99), ValueType::Other(99));
    /// ```
    pub fn from_raw(tag: u32) -> Self {
        match tag {
            0 => ValueType::None,
            1 => ValueType::String,
            2 => ValueType::ExpandString,
            3 => ValueType::Binary,
            4 => ValueType::Dword,
            5 => ValueType::DwordBigEndian,
            6 => ValueType::Link,
            7 => ValueType::MultiString,
            11 => ValueType::Qword,
            other => ValueType::Other(other),
        }
    }

    /// Returns the numeric tag of this type.
    pub fn as_raw(&self) -> u32 {
        match self {
            ValueType::None => 0,
            ValueType::String => 1,
            ValueType::ExpandString => 2,
            ValueType::Binary => 3,
            ValueType::Dword => 4,
            ValueType::DwordBigEndian => 5,
            ValueType::Link => 6,
            ValueType::MultiString => 7,
            ValueType::Qword => 11,
            ValueType::Other(tag) => *tag,
        }
    }

    /// Returns true for the three string-shaped types.
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            ValueType::String | ValueType::ExpandString | ValueType::MultiString
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::None => write!(f, "REG_NONE"),
            ValueType::String => write!(f, "REG_SZ"),
            ValueType::ExpandString => write!(f, "REG_EXPAND_SZ"),
            ValueType::Binary => write!(f, "REG_BINARY"),
            ValueType::Dword => write!(f, "REG_DWORD"),
            ValueType::DwordBigEndian => write!(f, "REG_DWORD_BIG_ENDIAN"),
            ValueType::Link => write!(f, "REG_LINK"),
            ValueType::MultiString => write!(f, "REG_MULTI_SZ"),
            ValueType::Qword => write!(f, "REG_QWORD"),
            ValueType::Other(tag) => write!(f, "type {}", tag),
        }
    }
}

/// The result of one successful read: the value's bytes and its declared type.
///
/// The byte vector's length is the size the store reported, never more than what was read.
///
/// # Examples
///
/// ```
/// use hexreg::domain::{RawValue, ValueType};
///
/// let value = RawValue::new(ValueType::String, vec![b'h', 0, b'i', 0, 0, 0]);
/// assert_eq!(value.len_chars(), 3);
/// assert_eq!(value.as_wide(), vec![u16::from(b'h'), u16::from(b'i'), 0]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawValue {
    value_type: ValueType,
    data: Vec<u8>,
}

impl RawValue {
    /// Creates a new `RawValue`.
    pub fn new(value_type: ValueType, data: Vec<u8>) -> Self {
        Self { value_type, data }
    }

    /// Returns the declared type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Returns the raw bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the size of the value in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the value has no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the size of the value in UTF-16 code units, dropping a trailing odd byte.
    pub fn len_chars(&self) -> usize {
        self.data.len() / 2
    }

    /// Reinterprets the bytes as UTF-16LE code units.
    pub fn as_wide(&self) -> Vec<u16> {
        self.data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }
}

/// Returns the number of code units before the first terminator, looking at most `max` units.
pub fn wide_len(buf: &[u16], max: usize) -> usize {
    let max = max.min(buf.len());
    buf[..max].iter().position(|&c| c == 0).unwrap_or(max)
}

/// Encodes a string as UTF-16 code units with a trailing terminator.
///
/// # Examples
///
/// ```
/// use hexreg::domain::value::encode_wide;
///
/// assert_eq!(encode_wide("ab"), vec![97, 98, 0]);
/// ```
pub fn encode_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Encodes UTF-16 code units as little-endian bytes.
pub fn wide_to_bytes(wide: &[u16]) -> Vec<u8> {
    wide.iter().flat_map(|c| c.to_le_bytes()).collect()
}

/// Decodes a normalized string buffer up to its first terminator.
///
/// # Examples
///
/// ```
/// use hexreg::domain::value::decode_string;
///
/// assert_eq!(decode_string(&[104, 105, 0, 120]), "hi");
/// ```
pub fn decode_string(buf: &[u16]) -> String {
    String::from_utf16_lossy(&buf[..wide_len(buf, buf.len())])
}

/// Decodes a normalized multi-string buffer into its strings.
///
/// Decoding stops at the list terminator (an empty string) or at the end of the buffer.
///
/// # Examples
///
/// ```
/// use hexreg::domain::value::decode_multi_string;
///
/// let buf = [97, 0, 98, 99, 0, 0];
/// assert_eq!(decode_multi_string(&buf), vec!["a".to_string(), "bc".to_string()]);
/// ```
pub fn decode_multi_string(buf: &[u16]) -> Vec<String> {
    let mut strings = Vec::new();
    let mut i = 0;
    while i < buf.len() {
        let len = wide_len(&buf[i..], buf.len() - i);
        if len == 0 {
            break;
        }
        strings.push(String::from_utf16_lossy(&buf[i..i + len]));
        i += len + 1;
    }
    strings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_round_trips_known_tags() {
        for tag in [0, 1, 2, 3, 4, 5, 6, 7, 11, 42] {
            assert_eq!(ValueType::from_raw(tag).as_raw(), tag);
        }
    }

    #[test]
    fn test_value_type_string_like() {
        assert!(ValueType::String.is_string_like());
        assert!(ValueType::ExpandString.is_string_like());
        assert!(ValueType::MultiString.is_string_like());
        assert!(!ValueType::Dword.is_string_like());
    }

    #[test]
    fn test_value_type_display() {
        assert_eq!(ValueType::Dword.to_string(), "REG_DWORD");
        assert_eq!(ValueType::Other(77).to_string(), "type 77");
    }

    #[test]
    fn test_raw_value_drops_odd_byte() {
        let value = RawValue::new(ValueType::String, vec![b'a', 0, b'b']);
        assert_eq!(value.len(), 3);
        assert_eq!(value.len_chars(), 1);
        assert_eq!(value.as_wide(), vec![u16::from(b'a')]);
    }

    #[test]
    fn test_wide_len_without_terminator() {
        assert_eq!(wide_len(&[1, 2, 3], 3), 3);
        assert_eq!(wide_len(&[1, 2, 3], 2), 2);
        assert_eq!(wide_len(&[1, 0, 3], 3), 1);
        assert_eq!(wide_len(&[1, 2], 10), 2);
    }

    #[test]
    fn test_decode_string_without_terminator() {
        let wide: Vec<u16> = "abc".encode_utf16().collect();
        assert_eq!(decode_string(&wide), "abc");
    }

    #[test]
    fn test_decode_multi_string_empty_list() {
        assert!(decode_multi_string(&[0, 0]).is_empty());
        assert!(decode_multi_string(&[]).is_empty());
    }

    #[test]
    fn test_wide_bytes_encoding() {
        assert_eq!(wide_to_bytes(&encode_wide("A")), vec![65, 0, 0, 0]);
    }
}
