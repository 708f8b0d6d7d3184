// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [`MemoryStore`] wrapper that records the calls the service layer makes.

use crate::adapters::{MemoryEvent, MemoryKey, MemoryStore};
use crate::domain::Result;
use crate::ports::{Access, ChangeEvent, ChangeFilter, QueryStatus, RegistryStore, WaitStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    CreateEvent(usize),
    DropEvent(usize),
    Notify { key: String, event: usize },
    Open { parent: String, name: String },
    Query { key: String },
}

type Hook = Box<dyn FnOnce(&MemoryStore) + Send>;

pub(crate) struct RecordingStore {
    inner: MemoryStore,
    calls: Arc<Mutex<Vec<Call>>>,
    next_event: AtomicUsize,
    on_miss: Mutex<Option<Hook>>,
}

impl RecordingStore {
    pub(crate) fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
            next_event: AtomicUsize::new(0),
            on_miss: Mutex::new(None),
        }
    }

    /// Runs `hook` against the store right after the first read that finds nothing, before the
    /// caller gets to wait.
    pub(crate) fn on_first_miss(self, hook: impl FnOnce(&MemoryStore) + Send + 'static) -> Self {
        *self.on_miss.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(hook));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn missed<T>(&self, result: Result<T>) -> Result<T> {
        if matches!(&result, Err(e) if e.is_not_found()) {
            let hook = self
                .on_miss
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(hook) = hook {
                hook(&self.inner);
            }
        }
        result
    }
}

pub(crate) struct RecordingEvent {
    id: usize,
    inner: MemoryEvent,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl ChangeEvent for RecordingEvent {
    fn wait(&self, timeout: Duration) -> Result<WaitStatus> {
        self.inner.wait(timeout)
    }
}

impl Drop for RecordingEvent {
    fn drop(&mut self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Call::DropEvent(self.id));
    }
}

impl RegistryStore for RecordingStore {
    type Key = MemoryKey;
    type Event = RecordingEvent;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn open_key(&self, parent: &MemoryKey, name: &str, access: Access) -> Result<MemoryKey> {
        self.record(Call::Open {
            parent: self.inner.key_path(parent),
            name: name.to_string(),
        });
        self.missed(self.inner.open_key(parent, name, access))
    }

    fn close_key(&self, key: MemoryKey) {
        self.inner.close_key(key);
    }

    fn create_event(&self) -> Result<RecordingEvent> {
        let id = self.next_event.fetch_add(1, Ordering::SeqCst);
        self.record(Call::CreateEvent(id));
        Ok(RecordingEvent {
            id,
            inner: self.inner.create_event()?,
            calls: Arc::clone(&self.calls),
        })
    }

    fn notify_change(
        &self,
        key: &MemoryKey,
        filter: ChangeFilter,
        watch_subtree: bool,
        event: &RecordingEvent,
    ) -> Result<()> {
        self.record(Call::Notify {
            key: self.inner.key_path(key),
            event: event.id,
        });
        self.inner
            .notify_change(key, filter, watch_subtree, &event.inner)
    }

    fn query_value(
        &self,
        key: &MemoryKey,
        name: Option<&str>,
        buf: &mut [u8],
    ) -> Result<QueryStatus> {
        self.record(Call::Query {
            key: self.inner.key_path(key),
        });
        self.missed(self.inner.query_value(key, name, buf))
    }

    fn key_path(&self, key: &MemoryKey) -> String {
        self.inner.key_path(key)
    }
}

/// Asserts that every open and every first query of an attempt comes right after arming a
/// notification on the key it reads from.
pub(crate) fn assert_armed_before_each_attempt(calls: &[Call]) {
    for (i, call) in calls.iter().enumerate() {
        let watched = match call {
            Call::Open { parent, .. } => parent,
            Call::Query { key } => match i.checked_sub(1).and_then(|prev| calls.get(prev)) {
                // Retries of the grow loop belong to the same attempt.
                Some(Call::Query { .. }) => continue,
                _ => key,
            },
            _ => continue,
        };
        match i.checked_sub(1).map(|prev| &calls[prev]) {
            Some(Call::Notify { key, .. }) if key == watched => {}
            other => panic!("{:?} at {} was preceded by {:?}", call, i, other),
        }
    }
}

/// Asserts that events are released and that at most one is alive at any time.
pub(crate) fn assert_one_event_at_a_time(calls: &[Call]) -> usize {
    let mut alive = None;
    let mut created = 0;
    for call in calls {
        match call {
            Call::CreateEvent(id) => {
                assert_eq!(alive, None, "event {} created while another was alive", id);
                alive = Some(*id);
                created += 1;
            }
            Call::DropEvent(id) => {
                assert_eq!(alive, Some(*id), "event {} dropped out of order", id);
                alive = None;
            }
            Call::Notify { event, .. } => assert_eq!(alive, Some(*event)),
            _ => {}
        }
    }
    assert_eq!(alive, None, "an event was never released");
    created
}
