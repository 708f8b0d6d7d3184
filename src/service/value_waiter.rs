// SPDX-License-Identifier: MIT OR Apache-2.0

//! Waiting for values to be written.

use crate::domain::{Deadline, Result};
use crate::ports::{ChangeFilter, EnvExpander, RegistryStore};
use crate::service::value_query::{display_name, ValueQuery};
use crate::service::wait::wait_for;

/// Reads a value, waiting for it to be set if it does not exist yet.
///
/// Only a missing value is waited on. A value of the wrong type or size fails at once, since
/// waiting longer cannot change it. The key must have been opened with both query and notify
/// access.
#[derive(Debug)]
pub struct ValueWaiter<'a, S: RegistryStore + ?Sized, E: EnvExpander + ?Sized> {
    store: &'a S,
    query: ValueQuery<'a, S, E>,
}

impl<'a, S, E> ValueWaiter<'a, S, E>
where
    S: RegistryStore + ?Sized,
    E: EnvExpander + ?Sized,
{
    /// Creates a waiter reading through `query`.
    pub fn new(store: &'a S, query: ValueQuery<'a, S, E>) -> Self {
        Self { store, query }
    }

    /// Waits for a string value; see [`ValueQuery::string`] for the accepted types.
    pub fn string(&self, key: &S::Key, name: Option<&str>, deadline: Deadline) -> Result<Vec<u16>> {
        wait_for(
            self.store,
            key,
            ChangeFilter::LastSet,
            deadline,
            || self.describe(key, name),
            || self.query.string(key, name),
        )
    }

    /// Waits for a 32-bit integer value.
    pub fn dword(&self, key: &S::Key, name: Option<&str>, deadline: Deadline) -> Result<u32> {
        wait_for(
            self.store,
            key,
            ChangeFilter::LastSet,
            deadline,
            || self.describe(key, name),
            || self.query.dword(key, name),
        )
    }

    fn describe(&self, key: &S::Key, name: Option<&str>) -> String {
        format!(
            "value {}\\{}",
            self.store.key_path(key),
            display_name(name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryStore, ProcessEnvExpander};
    use crate::domain::value::decode_string;
    use crate::domain::{RegistryError, ResolverOptions, ValueType};
    use crate::service::recording::{
        assert_armed_before_each_attempt, assert_one_event_at_a_time, RecordingStore,
    };
    use std::thread;
    use std::time::Duration;

    fn waiter<'a>(
        store: &'a MemoryStore,
        expander: &'a ProcessEnvExpander,
        options: &'a ResolverOptions,
    ) -> ValueWaiter<'a, MemoryStore, ProcessEnvExpander> {
        ValueWaiter::new(store, ValueQuery::new(store, expander, options))
    }

    #[test]
    fn test_dword_set_later_is_returned() {
        let store = MemoryStore::new();
        store.create_key("Iface").unwrap();
        let (expander, options) = (ProcessEnvExpander::new(), ResolverOptions::default());
        let root = store.root_key();
        let key = store.open_key(&root, "Iface", crate::ports::Access::READ).unwrap();

        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                store.set_dword("Iface", "Mtu", 1420).unwrap();
            })
        };
        let deadline = Deadline::after(store.now(), Duration::from_secs(2));
        let value = waiter(&store, &expander, &options)
            .dword(&key, Some("Mtu"), deadline)
            .unwrap();
        writer.join().unwrap();
        assert_eq!(value, 1420);
    }

    #[test]
    fn test_string_already_present() {
        let store = MemoryStore::new();
        store.set_string("", "Name", "wg0").unwrap();
        let (expander, options) = (ProcessEnvExpander::new(), ResolverOptions::default());
        let root = store.root_key();
        let deadline = Deadline::after(store.now(), Duration::ZERO);
        let out = waiter(&store, &expander, &options)
            .string(&root, Some("Name"), deadline)
            .unwrap();
        assert_eq!(decode_string(&out), "wg0");
    }

    #[test]
    fn test_missing_value_times_out() {
        let store = MemoryStore::new();
        let (expander, options) = (ProcessEnvExpander::new(), ResolverOptions::default());
        let root = store.root_key();
        let deadline = Deadline::after(store.now(), Duration::from_millis(30));
        let err = waiter(&store, &expander, &options)
            .string(&root, Some("Name"), deadline)
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("ROOT\\Name"));
    }

    #[test]
    fn test_wrong_size_is_not_retried() {
        let store = MemoryStore::new();
        store
            .set_value("", "Mtu", ValueType::Dword, vec![1, 0])
            .unwrap();
        let (expander, options) = (ProcessEnvExpander::new(), ResolverOptions::default());
        let root = store.root_key();
        let deadline = Deadline::after(store.now(), Duration::from_secs(10));
        let started = std::time::Instant::now();
        let err = waiter(&store, &expander, &options)
            .dword(&root, Some("Mtu"), deadline)
            .unwrap_err();
        assert!(matches!(err, RegistryError::TypeMismatch { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_write_between_check_and_wait_is_seen() {
        let store = MemoryStore::new();
        let recording = RecordingStore::new(store.clone())
            .on_first_miss(|store| store.set_dword("", "Mtu", 1280).unwrap());
        let (expander, options) = (ProcessEnvExpander::new(), ResolverOptions::default());
        let waiter = ValueWaiter::new(&recording, ValueQuery::new(&recording, &expander, &options));
        let root = store.root_key();
        let deadline = Deadline::after(recording.now(), Duration::from_millis(300));

        assert_eq!(waiter.dword(&root, Some("Mtu"), deadline).unwrap(), 1280);

        let calls = recording.calls();
        assert_armed_before_each_attempt(&calls);
        assert_eq!(assert_one_event_at_a_time(&calls), 1);
    }

    #[test]
    fn test_string_grow_retries_stay_within_one_attempt() {
        let store = MemoryStore::new();
        let recording = RecordingStore::new(store.clone());
        let (expander, options) = (
            ProcessEnvExpander::new(),
            ResolverOptions::default().initial_string_chars(1),
        );
        let waiter = ValueWaiter::new(&recording, ValueQuery::new(&recording, &expander, &options));
        let root = store.root_key();
        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                store.set_string("", "Name", "a longer name").unwrap();
            })
        };
        let deadline = Deadline::after(recording.now(), Duration::from_secs(2));
        let out = waiter.string(&root, Some("Name"), deadline).unwrap();
        writer.join().unwrap();

        assert_eq!(decode_string(&out), "a longer name");
        let calls = recording.calls();
        assert_armed_before_each_attempt(&calls);
        assert_eq!(assert_one_event_at_a_time(&calls), 1);
    }
}
