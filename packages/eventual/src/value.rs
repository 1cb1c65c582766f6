//! The eventual value container and its synchronization protocol.

use std::any::type_name;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::Instant;

use oneshot::RecvTimeoutError;

use crate::constants::ERR_POISONED_LOCK;
use crate::metrics::{GET_FAST_PATH, GET_TIMED_OUT, GET_WAIT_TIME_MS, WAITERS_NOTIFIED};
use crate::state::{STATE_CANCELED, STATE_SET, STATE_UNSET, state_name};
use crate::{GetError, SetError, Timeout, Wait};

/// A value that is not known yet but will be set (or canceled) at most once, which any number of
/// readers can wait for.
///
/// The value starts out unset. The first call to [`set()`][Self::set] or
/// [`cancel()`][Self::cancel] resolves it and every later write is ignored, so readers always
/// agree on the outcome. Readers call [`get()`][Self::get] with a [`Timeout`] to wait until the
/// value is resolved. Once resolved, reads complete without taking any lock.
///
/// Share the value between threads by reference (e.g. scoped threads) or via [`std::sync::Arc`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
/// use std::time::Duration;
///
/// use eventual::EventualValue;
///
/// let value = Arc::new(EventualValue::<String>::new());
///
/// let producer = thread::spawn({
///     let value = Arc::clone(&value);
///     move || value.set("hi".to_string())
/// });
///
/// let message = value.get(Duration::from_secs(10));
/// assert_eq!(message.as_deref(), Some("hi"));
/// # producer.join().unwrap();
/// ```
pub struct EventualValue<T> {
    // One of the `STATE_*` constants. Only written while holding the `waiters` lock.
    state: AtomicU8,

    // Stored before `state` becomes `STATE_SET` and never modified afterwards.
    payload: OnceLock<T>,

    waiters: Mutex<Waiters<T>>,
}

/// Mailboxes of the readers currently waiting for the value to be resolved.
struct Waiters<T> {
    entries: Vec<Waiter<T>>,

    // Source of registration identifiers, so that a reader can find its own entry again.
    next_id: u64,
}

struct Waiter<T> {
    id: WaiterId,
    sender: oneshot::Sender<T>,
}

/// Identifies one registered waiter of an [`EventualValue`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct WaiterId(u64);

/// What happens to a reader that asks to be notified about the value.
pub(crate) enum Registration<T> {
    /// No waiting is needed (or allowed); this is the outcome of the read.
    Resolved(Result<T, GetError>),

    /// The reader has been registered and must wait on the mailbox.
    Waiting(WaiterId, oneshot::Receiver<T>),
}

impl<T> EventualValue<T> {
    /// Creates a new value that has not been set yet.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eventual::EventualValue;
    ///
    /// let value = EventualValue::<u32>::new();
    /// assert!(!value.is_resolved());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_waiter_capacity(0)
    }

    /// Creates a new value that has not been set yet, reserving room for `capacity` concurrently
    /// waiting readers before the waiter collection needs to grow.
    #[must_use]
    pub fn with_waiter_capacity(capacity: usize) -> Self {
        Self {
            state: AtomicU8::new(STATE_UNSET),
            payload: OnceLock::new(),
            waiters: Mutex::new(Waiters {
                entries: Vec::with_capacity(capacity),
                next_id: 0,
            }),
        }
    }

    /// Whether a value has been set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_SET
    }

    /// Whether the value has been canceled without ever being set.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_CANCELED
    }

    /// Whether the value has been either set or canceled.
    ///
    /// Once this returns `true`, reads never wait.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state.load(Ordering::Acquire) != STATE_UNSET
    }

    /// Cancels the value, signaling every waiting reader that no value is coming.
    ///
    /// All current and future reads return [`None`] without waiting for their timeout.
    ///
    /// Has no effect if the value has already been set or canceled: readers keep observing the
    /// value that was set.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    ///
    /// use eventual::EventualValue;
    ///
    /// let value = EventualValue::<u32>::new();
    /// value.cancel();
    ///
    /// // Returns immediately instead of waiting an hour.
    /// assert_eq!(value.get(Duration::from_secs(3600)), None);
    ///
    /// // A canceled value can no longer be set.
    /// value.set(5);
    /// assert_eq!(value.get(Duration::ZERO), None);
    /// ```
    pub fn cancel(&self) {
        let released = {
            let mut waiters = self.lock_waiters();

            if self.state.load(Ordering::Relaxed) != STATE_UNSET {
                return;
            }

            self.state.store(STATE_CANCELED, Ordering::Release);
            mem::take(&mut waiters.entries)
        };

        WAITERS_NOTIFIED.with(|e| e.observe(released.len()));

        // Dropping a sender closes its mailbox without a value, which the reader takes as
        // cancellation. Done outside the lock so woken readers do not immediately contend on it.
        drop(released);
    }

    /// Removes a registration made by [`register()`][Self::register] that is no longer needed.
    ///
    /// Returns `false` if the registration is no longer present because a resolution has already
    /// claimed it for delivery.
    pub(crate) fn withdraw(&self, id: WaiterId) -> bool {
        let removed = {
            let mut waiters = self.lock_waiters();

            waiters
                .entries
                .iter()
                .position(|waiter| waiter.id == id)
                .map(|index| waiters.entries.remove(index))
        };

        removed.is_some()
    }

    #[cfg(test)]
    pub(crate) fn registered_waiters(&self) -> usize {
        self.lock_waiters().entries.len()
    }

    fn lock_waiters(&self) -> MutexGuard<'_, Waiters<T>> {
        self.waiters.lock().expect(ERR_POISONED_LOCK)
    }
}

impl<T> EventualValue<T>
where
    T: Clone,
{
    /// Sets the value, waking up every waiting reader with a clone of it.
    ///
    /// Only the first resolution counts. If the value has already been set or canceled, this
    /// call has no effect. Use [`try_set()`][Self::try_set] to find out whether the value was
    /// accepted.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    ///
    /// use eventual::EventualValue;
    ///
    /// let value = EventualValue::new();
    /// value.set("first");
    /// value.set("second");
    ///
    /// assert_eq!(value.get(Duration::ZERO), Some("first"));
    /// ```
    pub fn set(&self, value: T) {
        // A rejected value is simply dropped.
        drop(self.try_set(value));
    }

    /// Sets the value, waking up every waiting reader with a clone of it.
    ///
    /// # Errors
    ///
    /// Returns the rejected value inside [`SetError`] if the value has already been set or
    /// canceled. The earlier resolution stays in effect.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eventual::{EventualValue, SetError};
    ///
    /// let value = EventualValue::new();
    /// assert!(value.try_set(1).is_ok());
    ///
    /// let rejected = value.try_set(2).unwrap_err();
    /// assert!(matches!(rejected, SetError::AlreadySet(2)));
    /// ```
    #[cfg_attr(test, mutants::skip)] // Critical primitive - causes test timeouts if tampered.
    pub fn try_set(&self, value: T) -> Result<(), SetError<T>> {
        let released = {
            let mut waiters = self.lock_waiters();

            match self.state.load(Ordering::Relaxed) {
                STATE_UNSET => {}
                STATE_SET => return Err(SetError::AlreadySet(value)),
                _ => return Err(SetError::Canceled(value)),
            }

            // The payload must be in place before any reader can observe the new state.
            if self.payload.set(value).is_err() {
                unreachable!("payload is only stored while the value is unset");
            }

            self.state.store(STATE_SET, Ordering::Release);
            mem::take(&mut waiters.entries)
        };

        WAITERS_NOTIFIED.with(|e| e.observe(released.len()));

        // Delivery happens outside the lock. A reader that gives up in the meantime finds its
        // registration gone and reads the payload directly instead.
        if let Some(payload) = self.payload.get() {
            for waiter in released {
                // The reader may have stopped listening already, in which case nobody needs it.
                drop(waiter.sender.send(payload.clone()));
            }
        }

        Ok(())
    }

    /// Waits up to `timeout` for the value to be set and returns a clone of it.
    ///
    /// Returns [`None`] if the value is canceled or the timeout elapses first. With
    /// [`Timeout::Immediate`] (or a zero duration) the call never waits. With
    /// [`Timeout::Unbounded`] it waits until the value is resolved.
    ///
    /// Use [`try_get()`][Self::try_get] to find out why no value was returned.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    ///
    /// use eventual::EventualValue;
    ///
    /// let value = EventualValue::<u32>::new();
    /// assert_eq!(value.get(Duration::from_millis(1)), None);
    ///
    /// value.set(42);
    /// assert_eq!(value.get(Duration::from_millis(1)), Some(42));
    /// ```
    pub fn get(&self, timeout: impl Into<Timeout>) -> Option<T> {
        self.try_get(timeout).ok()
    }

    /// Waits up to `timeout` for the value to be set and returns a clone of it.
    ///
    /// # Errors
    ///
    /// Returns [`GetError::Canceled`] if the value is canceled before being set and
    /// [`GetError::TimedOut`] if the timeout elapses first.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    ///
    /// use eventual::{EventualValue, GetError};
    ///
    /// let value = EventualValue::<u32>::new();
    /// assert_eq!(value.try_get(Duration::ZERO), Err(GetError::TimedOut));
    ///
    /// value.cancel();
    /// assert_eq!(value.try_get(Duration::ZERO), Err(GetError::Canceled));
    /// ```
    pub fn try_get(&self, timeout: impl Into<Timeout>) -> Result<T, GetError> {
        let timeout = timeout.into();

        match self.register(timeout) {
            Registration::Resolved(outcome) => outcome,
            Registration::Waiting(id, mailbox) => GET_WAIT_TIME_MS.with(|e| {
                e.observe_duration_millis(|| self.wait_blocking(id, mailbox, timeout))
            }),
        }
    }

    /// Returns a future that completes when the value is resolved.
    ///
    /// The future has no deadline of its own; combine it with a timer if needed. Dropping an
    /// unfinished future withdraws its registration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use eventual::EventualValue;
    /// use futures::executor::block_on;
    ///
    /// let value = EventualValue::new();
    /// value.set(7);
    ///
    /// assert_eq!(block_on(value.wait()), Some(7));
    /// ```
    pub fn wait(&self) -> Wait<'_, T> {
        Wait::new(self)
    }

    /// Returns the outcome if the value is resolved, or registers a new waiter if not.
    ///
    /// No waiter is registered for [`Timeout::Immediate`]; an unresolved value is then reported
    /// as timed out.
    pub(crate) fn register(&self, timeout: Timeout) -> Registration<T> {
        if let Some(outcome) = self.resolved() {
            GET_FAST_PATH.with(|e| e.observe_once());
            return Registration::Resolved(outcome);
        }

        let mut waiters = self.lock_waiters();

        // The value may have been resolved between the check above and taking the lock. The
        // payload must not be cloned while the lock is held.
        if self.state.load(Ordering::Relaxed) != STATE_UNSET {
            drop(waiters);
            return Registration::Resolved(self.published_outcome());
        }

        if timeout.is_immediate() {
            drop(waiters);
            GET_TIMED_OUT.with(|e| e.observe_once());
            return Registration::Resolved(Err(GetError::TimedOut));
        }

        let (sender, receiver) = oneshot::channel();
        let id = WaiterId(waiters.next_id);
        waiters.next_id = waiters.next_id.wrapping_add(1);
        waiters.entries.push(Waiter { id, sender });

        Registration::Waiting(id, receiver)
    }

    /// Returns the outcome of a read if the value has been resolved.
    fn resolved(&self) -> Option<Result<T, GetError>> {
        match self.state.load(Ordering::Acquire) {
            STATE_UNSET => None,
            STATE_SET => match self.payload.get() {
                Some(payload) => Some(Ok(payload.clone())),
                None => unreachable!("value is marked as set but has no payload"),
            },
            STATE_CANCELED => Some(Err(GetError::Canceled)),
            other => unreachable!("invalid eventual value state: {other}"),
        }
    }

    #[cfg_attr(test, mutants::skip)] // Mutations cause reads to hang instead of failing.
    fn wait_blocking(
        &self,
        id: WaiterId,
        mailbox: oneshot::Receiver<T>,
        timeout: Timeout,
    ) -> Result<T, GetError> {
        let Some(deadline) = timeout.deadline_from(Instant::now()) else {
            // A mailbox closed without a value was drained by a resolution that then did not
            // deliver: either a cancellation or a set whose delivery was cut short by a panicking
            // clone. The published state tells which.
            return match mailbox.recv() {
                Ok(payload) => Ok(payload),
                Err(_closed) => self.published_outcome(),
            };
        };

        match mailbox.recv_deadline(deadline) {
            Ok(payload) => Ok(payload),
            Err(RecvTimeoutError::Disconnected) => self.published_outcome(),
            Err(RecvTimeoutError::Timeout) => {
                drop(mailbox);
                self.give_up(id)
            }
        }
    }

    /// Withdraws a timed out registration, unless a resolution got to it first.
    fn give_up(&self, id: WaiterId) -> Result<T, GetError> {
        if self.withdraw(id) {
            GET_TIMED_OUT.with(|e| e.observe_once());
            return Err(GetError::TimedOut);
        }

        // A resolution drained our registration just as the timeout elapsed. It published the
        // outcome before releasing the lock, so report that rather than a timeout.
        self.published_outcome()
    }

    /// Returns the outcome of a read from a value that is known to be resolved, such as one that
    /// has drained a registration.
    pub(crate) fn published_outcome(&self) -> Result<T, GetError> {
        match self.resolved() {
            Some(outcome) => outcome,
            None => unreachable!("waiter was drained while the value is still unset"),
        }
    }
}

impl<T> Default for EventualValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventualValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("state", &state_name(self.state.load(Ordering::Acquire)))
            .finish_non_exhaustive()
    }
}
