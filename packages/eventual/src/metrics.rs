//! Metrics for eventual values.
//!
//! These events describe how readers experience eventual values: how often the lock-free fast
//! path is enough, how long blocked readers wait and how many of them give up. Collect them with
//! [`nm::Report::collect()`].

use nm::{Event, Magnitude};

/// Histogram buckets for the time a reader spends blocked, in milliseconds.
///
/// Readers normally wait for a producer that is already running, so most waits should be short.
const WAIT_TIME_MS_BUCKETS: &[Magnitude] = &[0, 1, 2, 5, 10, 20, 50, 100, 200, 500, 1000, 5000];

/// Histogram buckets for the number of waiters released by a single resolution.
const WAITERS_NOTIFIED_BUCKETS: &[Magnitude] = &[0, 1, 2, 4, 8, 16, 32, 64, 128, 256];

thread_local! {
    /// A read found the value already resolved without taking the lock.
    pub(crate) static GET_FAST_PATH: Event = Event::builder()
        .name("eventual_get_fast_path")
        .build();

    /// Time a reader spent blocked on its mailbox, whatever the outcome.
    ///
    /// The magnitude is the wait time in milliseconds.
    pub(crate) static GET_WAIT_TIME_MS: Event = Event::builder()
        .name("eventual_get_wait_time_ms")
        .histogram(WAIT_TIME_MS_BUCKETS)
        .build();

    /// A read gave up because its timeout elapsed before the value was resolved.
    ///
    /// This includes reads with an immediate timeout that found the value unresolved, which give
    /// up without ever blocking.
    pub(crate) static GET_TIMED_OUT: Event = Event::builder()
        .name("eventual_get_timed_out")
        .build();

    /// A value was set or canceled.
    ///
    /// The magnitude is the number of registered waiters released by the resolution.
    pub(crate) static WAITERS_NOTIFIED: Event = Event::builder()
        .name("eventual_waiters_notified")
        .histogram(WAITERS_NOTIFIED_BUCKETS)
        .build();
}
