// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry store trait definition.
//!
//! This module defines the `RegistryStore` trait, the port through which the resolver opens
//! keys, arms change notifications and reads values. Any hierarchical key/value store (the
//! Windows registry, an in-memory tree, a test double) can back the resolver by implementing it.

use crate::domain::{Result, ValueType};
use crate::ports::event::ChangeEvent;
use bitflags::bitflags;
use std::time::Instant;

bitflags! {
    /// Access rights requested when opening a key.
    ///
    /// The bit values match the Windows registry access mask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Access: u32 {
        /// Read values.
        const QUERY_VALUE = 0x0001;
        /// Write values.
        const SET_VALUE = 0x0002;
        /// Create child keys.
        const CREATE_SUB_KEY = 0x0004;
        /// Enumerate child keys.
        const ENUMERATE_SUB_KEYS = 0x0008;
        /// Arm change notifications.
        const NOTIFY = 0x0010;
        /// Read the security descriptor.
        const READ_CONTROL = 0x0002_0000;
        /// The usual read-only combination.
        const READ = Self::QUERY_VALUE.bits()
            | Self::ENUMERATE_SUB_KEYS.bits()
            | Self::NOTIFY.bits()
            | Self::READ_CONTROL.bits();
    }
}

/// The class of changes a notification fires on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeFilter {
    /// A child key was created or deleted.
    Name,
    /// A value was set or deleted.
    LastSet,
}

/// The outcome of a single read attempt that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryStatus {
    /// The value fit; `len` bytes of the buffer are valid.
    Complete {
        /// The declared type of the value
        value_type: ValueType,
        /// The number of valid bytes
        len: usize,
    },
    /// The buffer was too small; the value currently needs `required` bytes.
    MoreData {
        /// The size the store reported
        required: usize,
    },
}

/// A hierarchical key/value store that can notify about changes.
///
/// Keys are opaque handles owned by whoever opened them and must be released with
/// [`close_key`](RegistryStore::close_key). Not-found conditions must be reported as
/// [`RegistryError::NotFound`](crate::domain::RegistryError::NotFound) and every other failure
/// as [`RegistryError::StoreError`](crate::domain::RegistryError::StoreError); the resolver
/// retries only the former.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. The resolver adds no locking of its own and relies
/// on the store for the thread safety of handles and notifications.
pub trait RegistryStore: Send + Sync {
    /// An open key.
    type Key: Send;

    /// A notification object that can be armed on a key and waited on.
    type Event: ChangeEvent;

    /// Returns the name of this store, used in error messages and logs.
    fn name(&self) -> &str;

    /// Opens `name` relative to `parent`. An empty name opens `parent` again.
    fn open_key(&self, parent: &Self::Key, name: &str, access: Access) -> Result<Self::Key>;

    /// Releases a key obtained from [`open_key`](RegistryStore::open_key).
    fn close_key(&self, key: Self::Key);

    /// Creates an unsignaled, auto-reset event.
    fn create_event(&self) -> Result<Self::Event>;

    /// Arms a one-shot notification that signals `event` on the next change of class `filter`.
    ///
    /// The key must have been opened with [`Access::NOTIFY`].
    fn notify_change(
        &self,
        key: &Self::Key,
        filter: ChangeFilter,
        watch_subtree: bool,
        event: &Self::Event,
    ) -> Result<()>;

    /// Reads value `name` (`None` for the default value) of `key` into `buf`.
    fn query_value(&self, key: &Self::Key, name: Option<&str>, buf: &mut [u8])
        -> Result<QueryStatus>;

    /// Returns a human-readable path of `key` for diagnostics.
    fn key_path(&self, key: &Self::Key) -> String;

    /// Returns the current monotonic time.
    fn now(&self) -> Instant {
        Instant::now()
    }
}
