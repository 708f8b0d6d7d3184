// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opening keys whose path may not exist yet.

use crate::domain::key_path::SEGMENT_DELIMITER;
use crate::domain::{Deadline, KeyPath, Result};
use crate::ports::{Access, ChangeFilter, RegistryStore};
use crate::service::owned_key::OwnedKey;
use crate::service::wait::wait_for;

/// Resolves a key path one segment at a time, waiting for each missing segment to be created.
///
/// Each level watches its parent for name changes, opens the child, and recurses into it with
/// the same deadline. Intermediate keys are opened with notify access only and are closed as
/// soon as the level below returns, so on success the caller holds exactly the final key.
///
/// # Examples
///
/// ```rust
/// use hexreg::adapters::MemoryStore;
/// use hexreg::domain::{Deadline, KeyPath};
/// use hexreg::ports::{Access, RegistryStore};
/// use hexreg::service::KeyPathResolver;
/// use std::time::Duration;
///
/// # fn main() -> hexreg::domain::Result<()> {
/// let store = MemoryStore::new();
/// store.create_key("SYSTEM\\Adapters\\wg0")?;
///
/// let root = store.root_key();
/// let resolver = KeyPathResolver::new(&store);
/// let deadline = Deadline::after(store.now(), Duration::from_millis(10));
/// let key = resolver.open_wait(&root, &KeyPath::from("SYSTEM\\Adapters\\wg0"), Access::READ, deadline)?;
/// assert_eq!(store.key_path(&key), "ROOT\\SYSTEM\\Adapters\\wg0");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct KeyPathResolver<'a, S: RegistryStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RegistryStore + ?Sized> KeyPathResolver<'a, S> {
    /// Creates a resolver over `store`.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Opens `path` below `root` with `access`, waiting until `deadline` for missing segments.
    ///
    /// An empty path reopens `root` itself without waiting. `root` must have been opened with
    /// [`Access::NOTIFY`].
    ///
    /// # Errors
    ///
    /// [`Timeout`](crate::domain::RegistryError::Timeout) if a segment is still missing at the
    /// deadline; any other store error aborts the resolution immediately.
    pub fn open_wait(
        &self,
        root: &S::Key,
        path: &KeyPath,
        access: Access,
        deadline: Deadline,
    ) -> Result<OwnedKey<'a, S>> {
        let segments = path.segments();
        let Some((first, rest)) = segments.split_first() else {
            // Nothing to wait for: the root already exists.
            let key = self.store.open_key(root, "", access)?;
            return Ok(OwnedKey::new(self.store, key));
        };
        self.open_segments(root, first, rest, access, deadline)
    }

    fn open_segments(
        &self,
        parent: &S::Key,
        segment: &str,
        rest: &[&str],
        access: Access,
        deadline: Deadline,
    ) -> Result<OwnedKey<'a, S>> {
        let child_access = if rest.is_empty() {
            access
        } else {
            Access::NOTIFY
        };

        let child = wait_for(
            self.store,
            parent,
            ChangeFilter::Name,
            deadline,
            || {
                format!(
                    "key {}{}{}",
                    self.store.key_path(parent),
                    SEGMENT_DELIMITER,
                    segment
                )
            },
            || self.store.open_key(parent, segment, child_access),
        )?;
        let child = OwnedKey::new(self.store, child);

        let Some((next, rest)) = rest.split_first() else {
            return Ok(child);
        };
        tracing::trace!("Opened {}, descending", self.store.key_path(&child));
        self.open_segments(&child, next, rest, access, deadline)
    }
}
