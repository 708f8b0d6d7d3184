// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory registry store adapter.
//!
//! This module provides a thread-safe hierarchical store that behaves like the Windows registry
//! as far as the resolver can observe: case-insensitive names, one-shot change notifications,
//! access checks and "buffer too small" reporting. A writer API lets another thread populate it
//! while a resolver waits.

use crate::domain::value::{encode_wide, wide_to_bytes};
use crate::domain::key_path::SEGMENT_DELIMITER;
use crate::domain::{RegistryError, Result, ValueType};
use crate::ports::{Access, ChangeEvent, ChangeFilter, QueryStatus, RegistryStore, WaitStatus};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

const STORE_NAME: &str = "memory";

/// Name of the root key in diagnostic paths.
const ROOT_NAME: &str = "ROOT";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

#[derive(Debug)]
struct Node {
    name: String,
    parent: Weak<Node>,
    state: Mutex<NodeState>,
}

#[derive(Debug, Default)]
struct NodeState {
    children: BTreeMap<String, Arc<Node>>,
    values: BTreeMap<String, StoredValue>,
    watches: Vec<Watch>,
    denied: bool,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct StoredValue {
    value_type: ValueType,
    data: Vec<u8>,
}

#[derive(Debug)]
struct Watch {
    filter: ChangeFilter,
    subtree: bool,
    event: Weak<EventState>,
}

#[derive(Debug, Default)]
struct EventState {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl EventState {
    fn signal(&self) {
        let mut signaled = lock(&self.signaled);
        *signaled = true;
        self.cond.notify_all();
    }
}

impl Node {
    fn new(name: &str, parent: Weak<Node>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            parent,
            state: Mutex::new(NodeState::default()),
        })
    }

    fn path(&self) -> String {
        let mut names = vec![self.name.clone()];
        let mut parent = self.parent.upgrade();
        while let Some(node) = parent {
            names.push(node.name.clone());
            parent = node.parent.upgrade();
        }
        names.reverse();
        names.join(&SEGMENT_DELIMITER.to_string())
    }

    fn child(&self, name: &str) -> Option<Arc<Node>> {
        lock(&self.state).children.get(&fold(name)).cloned()
    }

    /// Signals and disarms every watch on this node and its ancestors that `filter` triggers.
    fn fire(self: &Arc<Self>, filter: ChangeFilter) {
        let mut events = Vec::new();
        let mut current = Some(Arc::clone(self));
        let mut direct = true;
        while let Some(node) = current {
            {
                let mut state = lock(&node.state);
                state.watches.retain(|watch| {
                    if watch.filter == filter && (direct || watch.subtree) {
                        if let Some(event) = watch.event.upgrade() {
                            events.push(event);
                        }
                        false
                    } else {
                        watch.event.strong_count() > 0
                    }
                });
            }
            current = node.parent.upgrade();
            direct = false;
        }
        for event in events {
            event.signal();
        }
    }

    /// Marks this node and its subtree deleted and signals every watch armed on them.
    fn mark_deleted(self: &Arc<Self>) {
        let mut events = Vec::new();
        let mut pending = vec![Arc::clone(self)];
        while let Some(node) = pending.pop() {
            let mut state = lock(&node.state);
            state.deleted = true;
            events.extend(state.watches.drain(..).filter_map(|watch| watch.event.upgrade()));
            pending.extend(state.children.values().cloned());
        }
        for event in events {
            event.signal();
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if lock(&self.state).deleted {
            return Err(RegistryError::store(
                STORE_NAME,
                format!("key deleted: {}", self.path()),
            ));
        }
        Ok(())
    }
}

/// An open key of a [`MemoryStore`].
///
/// Dropping the key releases it; [`RegistryStore::close_key`] simply drops it.
#[derive(Debug)]
pub struct MemoryKey {
    node: Arc<Node>,
    access: Access,
    handles: Arc<AtomicUsize>,
}

impl MemoryKey {
    fn new(node: Arc<Node>, access: Access, handles: &Arc<AtomicUsize>) -> Self {
        handles.fetch_add(1, Ordering::SeqCst);
        Self {
            node,
            access,
            handles: Arc::clone(handles),
        }
    }

    /// Returns the access rights this key was opened with.
    pub fn access(&self) -> Access {
        self.access
    }
}

impl Drop for MemoryKey {
    fn drop(&mut self) {
        self.handles.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A notification event of a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryEvent {
    state: Arc<EventState>,
}

impl ChangeEvent for MemoryEvent {
    fn wait(&self, timeout: Duration) -> Result<WaitStatus> {
        let signaled = lock(&self.state.signaled);
        let (mut signaled, _) = self
            .state
            .cond
            .wait_timeout_while(signaled, timeout, |signaled| !*signaled)
            .unwrap_or_else(PoisonError::into_inner);
        if *signaled {
            *signaled = false;
            Ok(WaitStatus::Signaled)
        } else {
            Ok(WaitStatus::TimedOut)
        }
    }
}

/// A thread-safe in-memory hierarchical store.
///
/// Clones share the same tree, so one clone can be handed to a resolver while another
/// populates keys and values from a different thread.
///
/// # Examples
///
/// ```rust
/// use hexreg::adapters::MemoryStore;
/// use hexreg::ports::{Access, RegistryStore};
///
/// # fn main() -> hexreg::domain::Result<()> {
/// let store = MemoryStore::new();
/// store.create_key("SOFTWARE\\Vendor")?;
/// store.set_dword("SOFTWARE\\Vendor", "Port", 51820)?;
///
/// let root = store.root_key();
/// let key = store.open_key(&root, "software\\vendor", Access::READ)?;
/// assert_eq!(store.key_path(&key), "ROOT\\SOFTWARE\\Vendor");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct MemoryStore {
    root: Arc<Node>,
    handles: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            root: Node::new(ROOT_NAME, Weak::new()),
            handles: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Opens the root key with full access.
    pub fn root_key(&self) -> MemoryKey {
        MemoryKey::new(Arc::clone(&self.root), Access::all(), &self.handles)
    }

    /// Returns the number of keys currently open, root keys included.
    pub fn open_handle_count(&self) -> usize {
        self.handles.load(Ordering::SeqCst)
    }

    fn not_found(node: &Node, name: &str) -> RegistryError {
        RegistryError::NotFound {
            what: format!("{}{}{}", node.path(), SEGMENT_DELIMITER, name),
        }
    }

    fn walk(start: &Arc<Node>, path: &str) -> Result<Arc<Node>> {
        let mut node = Arc::clone(start);
        for segment in path.split(SEGMENT_DELIMITER).filter(|s| !s.is_empty()) {
            node = match node.child(segment) {
                Some(child) => child,
                None => return Err(Self::not_found(start, path)),
            };
        }
        Ok(node)
    }

    /// Creates `path` below the root, including missing intermediate keys.
    ///
    /// Each newly created key fires name-change notifications on its parent.
    pub fn create_key(&self, path: &str) -> Result<()> {
        let mut node = Arc::clone(&self.root);
        for segment in path.split(SEGMENT_DELIMITER).filter(|s| !s.is_empty()) {
            let (child, created) = {
                let mut state = lock(&node.state);
                match state.children.get(&fold(segment)) {
                    Some(child) => (Arc::clone(child), false),
                    None => {
                        let child = Node::new(segment, Arc::downgrade(&node));
                        state.children.insert(fold(segment), Arc::clone(&child));
                        (child, true)
                    }
                }
            };
            if created {
                tracing::trace!("Created key {}", child.path());
                node.fire(ChangeFilter::Name);
            }
            node = child;
        }
        Ok(())
    }

    /// Deletes the key at `path` and everything below it.
    ///
    /// Watches armed on the deleted keys are signaled, and keys still open below `path` fail
    /// every later operation with a store error.
    pub fn delete_key(&self, path: &str) -> Result<()> {
        let node = Self::walk(&self.root, path)?;
        let parent = node
            .parent
            .upgrade()
            .ok_or_else(|| RegistryError::store(STORE_NAME, "the root key cannot be deleted"))?;
        lock(&parent.state).children.remove(&fold(&node.name));
        node.mark_deleted();
        parent.fire(ChangeFilter::Name);
        Ok(())
    }

    /// Sets a value of any type under the existing key at `path`.
    pub fn set_value(
        &self,
        path: &str,
        name: &str,
        value_type: ValueType,
        data: Vec<u8>,
    ) -> Result<()> {
        let node = Self::walk(&self.root, path)?;
        lock(&node.state)
            .values
            .insert(fold(name), StoredValue { value_type, data });
        node.fire(ChangeFilter::LastSet);
        Ok(())
    }

    /// Sets a terminated string value.
    pub fn set_string(&self, path: &str, name: &str, value: &str) -> Result<()> {
        self.set_value(
            path,
            name,
            ValueType::String,
            wide_to_bytes(&encode_wide(value)),
        )
    }

    /// Sets a terminated expandable string value.
    pub fn set_expand_string(&self, path: &str, name: &str, value: &str) -> Result<()> {
        self.set_value(
            path,
            name,
            ValueType::ExpandString,
            wide_to_bytes(&encode_wide(value)),
        )
    }

    /// Sets a well-formed multi-string value.
    pub fn set_multi_string(&self, path: &str, name: &str, values: &[&str]) -> Result<()> {
        let mut wide: Vec<u16> = values.iter().flat_map(|v| encode_wide(v)).collect();
        wide.push(0);
        self.set_value(path, name, ValueType::MultiString, wide_to_bytes(&wide))
    }

    /// Sets a 32-bit integer value.
    pub fn set_dword(&self, path: &str, name: &str, value: u32) -> Result<()> {
        self.set_value(path, name, ValueType::Dword, value.to_le_bytes().to_vec())
    }

    /// Deletes a value.
    pub fn delete_value(&self, path: &str, name: &str) -> Result<()> {
        let node = Self::walk(&self.root, path)?;
        let removed = lock(&node.state).values.remove(&fold(name));
        if removed.is_none() {
            return Err(Self::not_found(&node, name));
        }
        node.fire(ChangeFilter::LastSet);
        Ok(())
    }

    /// Makes opening the key at `path` fail with an access-denied store error.
    pub fn set_access_denied(&self, path: &str, denied: bool) -> Result<()> {
        let node = Self::walk(&self.root, path)?;
        lock(&node.state).denied = denied;
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryStore for MemoryStore {
    type Key = MemoryKey;
    type Event = MemoryEvent;

    fn name(&self) -> &str {
        STORE_NAME
    }

    fn open_key(&self, parent: &MemoryKey, name: &str, access: Access) -> Result<MemoryKey> {
        parent.node.ensure_live()?;
        let node = Self::walk(&parent.node, name)?;
        if lock(&node.state).denied {
            return Err(RegistryError::store(
                STORE_NAME,
                format!("access denied opening {}", node.path()),
            ));
        }
        Ok(MemoryKey::new(node, access, &self.handles))
    }

    fn close_key(&self, key: MemoryKey) {
        drop(key);
    }

    fn create_event(&self) -> Result<MemoryEvent> {
        Ok(MemoryEvent {
            state: Arc::new(EventState::default()),
        })
    }

    fn notify_change(
        &self,
        key: &MemoryKey,
        filter: ChangeFilter,
        watch_subtree: bool,
        event: &MemoryEvent,
    ) -> Result<()> {
        if !key.access.contains(Access::NOTIFY) {
            return Err(RegistryError::store(
                STORE_NAME,
                format!("{} was not opened with notify access", key.node.path()),
            ));
        }
        key.node.ensure_live()?;
        let mut state = lock(&key.node.state);
        state.watches.retain(|watch| watch.event.strong_count() > 0);
        state.watches.push(Watch {
            filter,
            subtree: watch_subtree,
            event: Arc::downgrade(&event.state),
        });
        Ok(())
    }

    fn query_value(
        &self,
        key: &MemoryKey,
        name: Option<&str>,
        buf: &mut [u8],
    ) -> Result<QueryStatus> {
        if !key.access.contains(Access::QUERY_VALUE) {
            return Err(RegistryError::store(
                STORE_NAME,
                format!("{} was not opened with query access", key.node.path()),
            ));
        }
        key.node.ensure_live()?;
        let name = name.unwrap_or("");
        let state = lock(&key.node.state);
        let value = state
            .values
            .get(&fold(name))
            .ok_or_else(|| Self::not_found(&key.node, name))?;
        if buf.len() < value.data.len() {
            return Ok(QueryStatus::MoreData {
                required: value.data.len(),
            });
        }
        buf[..value.data.len()].copy_from_slice(&value.data);
        Ok(QueryStatus::Complete {
            value_type: value.value_type,
            len: value.data.len(),
        })
    }

    fn key_path(&self, key: &MemoryKey) -> String {
        key.node.path()
    }
}
