// SPDX-License-Identifier: MIT OR Apache-2.0

//! The arm-then-check wait loop shared by key and value waiting.

use crate::domain::{Deadline, RegistryError, Result};
use crate::ports::{ChangeEvent, ChangeFilter, RegistryStore, WaitStatus};

/// Runs `attempt` until it succeeds, fails with something other than not-found, or `deadline`
/// passes.
///
/// The notification on `key` is armed before every attempt so that a change landing between
/// the attempt and the wait still signals the event. An elapsed deadline becomes a zero-length
/// poll, so at least one attempt is always made.
pub(crate) fn wait_for<S, T>(
    store: &S,
    key: &S::Key,
    filter: ChangeFilter,
    deadline: Deadline,
    what: impl Fn() -> String,
    mut attempt: impl FnMut() -> Result<T>,
) -> Result<T>
where
    S: RegistryStore + ?Sized,
{
    let event = store.create_event()?;
    loop {
        store.notify_change(key, filter, false, &event)?;

        match attempt() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let now = store.now();
        if deadline.is_expired(now) {
            tracing::trace!("Deadline passed, checking once for a change to {}", what());
        } else {
            tracing::trace!("Waiting up to {:?} for {}", deadline.remaining(now), what());
        }
        match event.wait(deadline.remaining(now))? {
            WaitStatus::Signaled => continue,
            WaitStatus::TimedOut => {
                return Err(RegistryError::Timeout {
                    what: what(),
                    waited: deadline.budget(),
                })
            }
        }
    }
}
