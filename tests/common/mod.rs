// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for the integration tests.

use hexreg::adapters::MemoryStore;
use std::sync::Once;
use std::thread::{self, JoinHandle};
use std::time::Duration;

static TRACING: Once = Once::new();

/// Installs a `tracing` subscriber that writes through the test harness, once per binary.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .try_init();
    });
}

/// Runs `write` against a clone of `store` on another thread after `delay`.
#[allow(dead_code)]
pub fn write_later<F>(store: &MemoryStore, delay: Duration, write: F) -> JoinHandle<()>
where
    F: FnOnce(&MemoryStore) + Send + 'static,
{
    let store = store.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        write(&store);
    })
}
