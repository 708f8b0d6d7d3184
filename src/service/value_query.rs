// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single best-effort reads of values of unknown size.
//!
//! Nothing here logs above `trace`: these reads also run inside wait loops, where a missing
//! value is expected. Reporting is left to the caller-facing operations.

use crate::domain::buffer::alloc_zeroed;
use crate::domain::{RawValue, RegistryError, ResolverOptions, Result, ValueType};
use crate::ports::{EnvExpander, QueryStatus, RegistryStore};
use crate::service::string_normalizer::StringNormalizer;

/// Size of a 32-bit integer value in bytes.
const DWORD_SIZE: usize = 4;

pub(crate) fn display_name(name: Option<&str>) -> &str {
    match name {
        Some(name) if !name.is_empty() => name,
        _ => "(Default)",
    }
}

/// Reads values with growth-on-demand buffering and typed post-processing.
///
/// # Examples
///
/// ```rust
/// use hexreg::adapters::MemoryStore;
/// use hexreg::service::RegistryResolver;
///
/// # fn main() -> hexreg::domain::Result<()> {
/// let store = MemoryStore::new();
/// store.set_string("", "Banner", &"=".repeat(10_000))?;
///
/// let resolver = RegistryResolver::new(store.clone());
/// let root = store.root_key();
/// let raw = resolver.value_query().raw(&root, Some("Banner"), 1)?;
/// assert_eq!(raw.len(), 10_001 * 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ValueQuery<'a, S: RegistryStore + ?Sized, E: EnvExpander + ?Sized> {
    store: &'a S,
    normalizer: StringNormalizer<'a, E>,
    options: &'a ResolverOptions,
}

impl<'a, S, E> ValueQuery<'a, S, E>
where
    S: RegistryStore + ?Sized,
    E: EnvExpander + ?Sized,
{
    /// Creates a query over `store`.
    pub fn new(store: &'a S, expander: &'a E, options: &'a ResolverOptions) -> Self {
        Self {
            store,
            normalizer: StringNormalizer::new(expander, options.max_grow_attempts),
            options,
        }
    }

    /// Reads a value, starting with a `size_hint`-byte buffer.
    ///
    /// When the store reports the buffer too small, a buffer of exactly the reported size is
    /// allocated and the read retried, up to the configured attempt cap. Any other error is
    /// returned as is.
    pub fn raw(&self, key: &S::Key, name: Option<&str>, size_hint: usize) -> Result<RawValue> {
        let attempts = self.options.max_grow_attempts.max(1);
        let mut size = size_hint;
        for _ in 0..attempts {
            let mut buf = alloc_zeroed::<u8>(size)?;
            match self.store.query_value(key, name, &mut buf)? {
                QueryStatus::Complete { value_type, len } => {
                    if len > buf.len() {
                        return Err(RegistryError::store(
                            self.store.name(),
                            format!(
                                "value {} reported {} bytes for a {}-byte buffer",
                                display_name(name),
                                len,
                                buf.len()
                            ),
                        ));
                    }
                    buf.truncate(len);
                    return Ok(RawValue::new(value_type, buf));
                }
                QueryStatus::MoreData { required } => {
                    tracing::trace!(
                        "Value {} needs {} bytes, have {}",
                        display_name(name),
                        required,
                        size
                    );
                    size = required;
                }
            }
        }
        Err(RegistryError::RetryLimitExceeded {
            operation: "value query",
            attempts,
        })
    }

    fn string_value(
        &self,
        key: &S::Key,
        name: Option<&str>,
    ) -> Result<(Vec<u16>, usize, ValueType)> {
        let raw = self.raw(key, name, self.options.initial_string_chars.saturating_mul(2))?;
        let value_type = raw.value_type();
        if !value_type.is_string_like() {
            return Err(RegistryError::TypeMismatch {
                name: display_name(name).to_string(),
                message: format!("expected a string, found {}", value_type),
            });
        }
        Ok((raw.as_wide(), raw.len_chars(), value_type))
    }

    /// Reads a string, expandable-string or multi-string value as one terminated string.
    ///
    /// Expandable strings are expanded; for multi-strings the first string is returned.
    pub fn string(&self, key: &S::Key, name: Option<&str>) -> Result<Vec<u16>> {
        let (wide, len, value_type) = self.string_value(key, name)?;
        self.normalizer.normalize_string(wide, len, value_type)
    }

    /// Reads a string-shaped value as a doubly terminated string list.
    pub fn multi_string(&self, key: &S::Key, name: Option<&str>) -> Result<Vec<u16>> {
        let (wide, len, value_type) = self.string_value(key, name)?;
        self.normalizer
            .normalize_multi_string(wide, len, value_type)
    }

    /// Reads a 32-bit integer value, rejecting any other type or size.
    pub fn dword(&self, key: &S::Key, name: Option<&str>) -> Result<u32> {
        let raw = self.raw(key, name, DWORD_SIZE)?;
        if raw.value_type() != ValueType::Dword {
            return Err(RegistryError::TypeMismatch {
                name: display_name(name).to_string(),
                message: format!("expected REG_DWORD, found {}", raw.value_type()),
            });
        }
        let bytes: [u8; DWORD_SIZE] =
            raw.data()
                .try_into()
                .map_err(|_| RegistryError::TypeMismatch {
                    name: display_name(name).to_string(),
                    message: format!("size is not {} bytes (size: {})", DWORD_SIZE, raw.len()),
                })?;
        Ok(u32::from_le_bytes(bytes))
    }
}
