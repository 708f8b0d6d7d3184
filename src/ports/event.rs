// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change event trait definition.
//!
//! This module defines the `ChangeEvent` trait, the waitable half of a store notification.
//! An event is armed on a key through [`RegistryStore::notify_change`](crate::ports::RegistryStore::notify_change)
//! and then waited on with a timeout.

use crate::domain::Result;
use std::time::Duration;

/// How a wait on a [`ChangeEvent`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitStatus {
    /// The event was signaled; it has been reset.
    Signaled,
    /// The timeout elapsed first.
    TimedOut,
}

/// An edge-triggered, auto-reset event.
///
/// Events are released when dropped.
///
/// # Examples
///
/// ```rust
/// use hexreg::ports::{ChangeEvent, WaitStatus};
/// use hexreg::domain::Result;
/// use std::time::Duration;
///
/// struct NeverSignaled;
///
/// impl ChangeEvent for NeverSignaled {
///     fn wait(&self, _timeout: Duration) -> Result<WaitStatus> {
///         Ok(WaitStatus::TimedOut)
///     }
/// }
///
/// let event = NeverSignaled;
/// assert_eq!(event.wait(Duration::ZERO).unwrap(), WaitStatus::TimedOut);
/// ```
pub trait ChangeEvent: Send {
    /// Blocks until the event is signaled or `timeout` elapses.
    ///
    /// A zero timeout polls without blocking.
    fn wait(&self, timeout: Duration) -> Result<WaitStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlagEvent {
        signaled: AtomicBool,
    }

    impl ChangeEvent for FlagEvent {
        fn wait(&self, _timeout: Duration) -> Result<WaitStatus> {
            if self.signaled.swap(false, Ordering::SeqCst) {
                Ok(WaitStatus::Signaled)
            } else {
                Ok(WaitStatus::TimedOut)
            }
        }
    }

    #[test]
    fn test_event_auto_resets() {
        let event = FlagEvent {
            signaled: AtomicBool::new(true),
        };
        assert_eq!(event.wait(Duration::ZERO).unwrap(), WaitStatus::Signaled);
        assert_eq!(event.wait(Duration::ZERO).unwrap(), WaitStatus::TimedOut);
    }

    #[test]
    fn test_event_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Box<dyn ChangeEvent>>();
    }
}
