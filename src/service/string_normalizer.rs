// SPDX-License-Identifier: MIT OR Apache-2.0

//! Termination repair, variable expansion and multi-string conversion for string values.
//!
//! Buffers handled here come straight from the store: their declared length is trusted only as
//! an upper bound and their terminators are not trusted at all.

use crate::domain::buffer::{alloc_zeroed, resize_zeroed};
use crate::domain::value::{decode_string, wide_len};
use crate::domain::{RegistryError, Result, ValueType};
use crate::ports::EnvExpander;

/// Normalizes string-shaped value buffers.
///
/// # Examples
///
/// ```rust
/// use hexreg::adapters::ProcessEnvExpander;
/// use hexreg::domain::ValueType;
/// use hexreg::service::StringNormalizer;
///
/// let expander = ProcessEnvExpander::new();
/// let normalizer = StringNormalizer::new(&expander, 16);
///
/// // "abc\0" declared as a multi-string is missing its list terminator.
/// let buf: Vec<u16> = vec![97, 98, 99, 0];
/// let fixed = normalizer.normalize_multi_string(buf, 4, ValueType::MultiString).unwrap();
/// assert_eq!(fixed, vec![97, 98, 99, 0, 0]);
/// ```
#[derive(Debug)]
pub struct StringNormalizer<'a, E: EnvExpander + ?Sized> {
    expander: &'a E,
    max_grow_attempts: usize,
}

impl<'a, E: EnvExpander + ?Sized> StringNormalizer<'a, E> {
    /// Creates a normalizer; `max_grow_attempts` caps the expansion grow loop.
    pub fn new(expander: &'a E, max_grow_attempts: usize) -> Self {
        Self {
            expander,
            max_grow_attempts: max_grow_attempts.max(1),
        }
    }

    /// Guarantees a terminator and expands `%NAME%` references for expandable strings.
    ///
    /// `len` is the declared length in code units. If no terminator occurs within it, the buffer
    /// is cut to `len` and one zero is appended, so the result is never shorter than `len`.
    /// Expandable strings are then expanded; an empty one is returned as is.
    pub fn normalize_string(
        &self,
        mut buf: Vec<u16>,
        len: usize,
        value_type: ValueType,
    ) -> Result<Vec<u16>> {
        let len = len.min(buf.len());
        if wide_len(&buf, len) >= len {
            buf.truncate(len);
            resize_zeroed(&mut buf, len + 1)?;
        }

        if value_type != ValueType::ExpandString {
            return Ok(buf);
        }

        // The expansion primitive reports failure as 0, which an empty input could also yield.
        if buf.first().copied().unwrap_or(0) == 0 {
            return Ok(buf);
        }

        self.expand(&buf, len)
    }

    fn expand(&self, buf: &[u16], len: usize) -> Result<Vec<u16>> {
        let mut capacity = len.max(1);
        for _ in 0..self.max_grow_attempts {
            let mut expanded = alloc_zeroed::<u16>(capacity)?;
            let required = self.expander.expand(buf, &mut expanded) as usize;
            if required == 0 {
                return Err(RegistryError::ExpansionFailed {
                    input: decode_string(buf),
                });
            }
            if required > capacity {
                tracing::trace!(
                    "Expansion needs {} code units, have {}",
                    required,
                    capacity
                );
                capacity = required;
                continue;
            }
            expanded.truncate(required);
            return Ok(expanded);
        }
        Err(RegistryError::RetryLimitExceeded {
            operation: "environment variable expansion",
            attempts: self.max_grow_attempts,
        })
    }

    /// Produces a list of terminated strings followed by a list terminator.
    ///
    /// Multi-string buffers are scanned up to `len`. A list that runs past `len` with a dangling
    /// string gets that string's terminator and the list terminator appended; a list whose last
    /// string ends exactly at `len` gets the list terminator appended; a list terminated within
    /// bounds is returned unchanged. Other string types are normalized as single strings and
    /// become a one-element list.
    pub fn normalize_multi_string(
        &self,
        mut buf: Vec<u16>,
        len: usize,
        value_type: ValueType,
    ) -> Result<Vec<u16>> {
        let len = len.min(buf.len());
        if value_type == ValueType::MultiString {
            let mut i = 0;
            loop {
                if i > len {
                    buf.truncate(len);
                    resize_zeroed(&mut buf, len + 2)?;
                    break;
                }
                if i == len {
                    buf.truncate(len);
                    resize_zeroed(&mut buf, len + 1)?;
                    break;
                }
                if buf[i] == 0 {
                    break;
                }
                i += wide_len(&buf[i..], len - i) + 1;
            }
            // An empty list still carries both terminators.
            if buf.len() < 2 {
                resize_zeroed(&mut buf, 2)?;
            }
            return Ok(buf);
        }

        let mut buf = self.normalize_string(buf, len, value_type)?;
        let len = wide_len(&buf, buf.len()) + 1;
        buf.truncate(len);
        resize_zeroed(&mut buf, len + 1)?;
        Ok(buf)
    }
}
