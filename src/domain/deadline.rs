// SPDX-License-Identifier: MIT OR Apache-2.0

//! Absolute deadlines shared by every step of a waiting operation.

use std::time::{Duration, Instant};

/// Upper bound used when `now + timeout` would overflow the clock.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// An absolute monotonic point in time after which a wait gives up.
///
/// A deadline is computed once at the outermost call and passed by value through every
/// recursive or retrying step, so the whole operation shares one timeout budget.
///
/// # Examples
///
/// ```
/// use hexreg::domain::Deadline;
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let deadline = Deadline::after(start, Duration::from_millis(100));
/// assert_eq!(deadline.remaining(start), Duration::from_millis(100));
/// assert_eq!(deadline.remaining(start + Duration::from_secs(1)), Duration::ZERO);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Creates a deadline `timeout` after `now`.
    pub fn after(now: Instant, timeout: Duration) -> Self {
        let at = now
            .checked_add(timeout)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self {
            at,
            budget: timeout,
        }
    }

    /// Returns the time left before the deadline, clamped to zero once it has passed.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.at.saturating_duration_since(now)
    }

    /// Returns true once `now` has reached the deadline.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.at
    }

    /// Returns the timeout this deadline was created with.
    pub fn budget(&self) -> Duration {
        self.budget
    }
}
