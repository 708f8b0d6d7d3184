// SPDX-License-Identifier: MIT OR Apache-2.0

//! RAII ownership of open keys.

use crate::ports::RegistryStore;
use std::fmt;
use std::ops::Deref;

/// An open key that is released through its store when dropped.
///
/// Every key the resolver opens is wrapped in an `OwnedKey`, so intermediate keys are closed on
/// every exit path and the caller of
/// [`open_key_wait`](crate::service::RegistryResolver::open_key_wait) owns exactly one key.
///
/// # Examples
///
/// ```rust
/// use hexreg::adapters::MemoryStore;
/// use hexreg::ports::{Access, RegistryStore};
/// use hexreg::service::OwnedKey;
///
/// let store = MemoryStore::new();
/// let root = store.root_key();
/// let before = store.open_handle_count();
/// {
///     let key = OwnedKey::new(&store, store.open_key(&root, "", Access::READ).unwrap());
///     assert_eq!(store.key_path(&key), "ROOT");
///     assert_eq!(store.open_handle_count(), before + 1);
/// }
/// assert_eq!(store.open_handle_count(), before);
/// ```
pub struct OwnedKey<'s, S: RegistryStore + ?Sized> {
    store: &'s S,
    key: Option<S::Key>,
}

impl<'s, S: RegistryStore + ?Sized> OwnedKey<'s, S> {
    /// Takes ownership of `key`, to be closed through `store`.
    pub fn new(store: &'s S, key: S::Key) -> Self {
        Self {
            store,
            key: Some(key),
        }
    }

    /// Releases ownership without closing the key.
    pub fn into_inner(mut self) -> S::Key {
        self.key
            .take()
            .expect("key is present until into_inner or drop")
    }
}

impl<S: RegistryStore + ?Sized> Deref for OwnedKey<'_, S> {
    type Target = S::Key;

    fn deref(&self) -> &S::Key {
        self.key
            .as_ref()
            .expect("key is present until into_inner or drop")
    }
}

impl<S: RegistryStore + ?Sized> Drop for OwnedKey<'_, S> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.store.close_key(key);
        }
    }
}

impl<S: RegistryStore + ?Sized> fmt::Debug for OwnedKey<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.key.as_ref().map(|key| self.store.key_path(key));
        f.debug_struct("OwnedKey")
            .field("store", &self.store.name())
            .field("path", &path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::ports::Access;

    #[test]
    fn test_drop_closes_key() {
        let store = MemoryStore::new();
        let root = store.root_key();
        let key = OwnedKey::new(&store, store.open_key(&root, "", Access::READ).unwrap());
        assert_eq!(store.open_handle_count(), 2);
        drop(key);
        assert_eq!(store.open_handle_count(), 1);
    }

    #[test]
    fn test_into_inner_transfers_ownership() {
        let store = MemoryStore::new();
        let root = store.root_key();
        let owned = OwnedKey::new(&store, store.open_key(&root, "", Access::READ).unwrap());
        let raw = owned.into_inner();
        assert_eq!(store.open_handle_count(), 2);
        store.close_key(raw);
        assert_eq!(store.open_handle_count(), 1);
    }

    #[test]
    fn test_debug_shows_path() {
        let store = MemoryStore::new();
        let root = store.root_key();
        let owned = OwnedKey::new(&store, store.open_key(&root, "", Access::READ).unwrap());
        let debug = format!("{:?}", owned);
        assert!(debug.contains("ROOT"));
        assert!(debug.contains("memory"));
    }
}
