use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;

use crate::value::{Registration, WaiterId};
use crate::{EventualValue, Timeout};

/// A future that completes when an [`EventualValue`] is resolved.
///
/// Resolves to `Some(value)` once the value is set and to [`None`] if it is canceled.
/// There is no deadline; race the future against a timer to bound the wait.
///
/// Created by [`EventualValue::wait()`].
///
/// # Panics
///
/// Panics if polled again after it has completed.
#[must_use = "futures do nothing unless polled"]
pub struct Wait<'a, T> {
    value: &'a EventualValue<T>,
    stage: Stage<T>,
}

enum Stage<T> {
    /// Not polled yet, so nothing is registered with the value.
    Unregistered,

    /// Registered with the value and waiting for the mailbox to be filled or closed.
    Registered {
        id: WaiterId,
        mailbox: oneshot::Receiver<T>,
    },

    /// The outcome has been returned from `poll()`.
    Completed,
}

impl<'a, T> Wait<'a, T> {
    pub(crate) fn new(value: &'a EventualValue<T>) -> Self {
        Self {
            value,
            stage: Stage::Unregistered,
        }
    }
}

impl<T> Future for Wait<'_, T>
where
    T: Clone,
{
    type Output = Option<T>;

    #[cfg_attr(test, mutants::skip)] // Critical for code execution to occur in async contexts.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if matches!(this.stage, Stage::Unregistered) {
            match this.value.register(Timeout::Unbounded) {
                Registration::Resolved(outcome) => {
                    this.stage = Stage::Completed;
                    return Poll::Ready(outcome.ok());
                }
                Registration::Waiting(id, mailbox) => {
                    this.stage = Stage::Registered { id, mailbox };
                }
            }
        }

        let Stage::Registered { mailbox, .. } = &mut this.stage else {
            panic!("Wait polled after completion");
        };

        match Pin::new(mailbox).poll(cx) {
            Poll::Ready(received) => {
                // The registration was drained by the resolution, so there is nothing to withdraw.
                this.stage = Stage::Completed;

                // A closed mailbox only says that delivery did not happen, not why.
                Poll::Ready(match received {
                    Ok(payload) => Some(payload),
                    Err(_closed) => this.value.published_outcome().ok(),
                })
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

// We never project the pin onto any field.
impl<T> Unpin for Wait<'_, T> {}

impl<T> Drop for Wait<'_, T> {
    fn drop(&mut self) {
        if let Stage::Registered { id, mailbox } = mem::replace(&mut self.stage, Stage::Completed)
        {
            drop(mailbox);

            // Taking the lock can panic if it is poisoned, which would abort an unwinding thread.
            // Skipping the withdrawal only leaves the entry until the next resolution drains it.
            if !thread::panicking() {
                self.value.withdraw(id);
            }
        }
    }
}

impl<T> fmt::Debug for Wait<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.stage {
            Stage::Unregistered => "unregistered",
            Stage::Registered { .. } => "registered",
            Stage::Completed => "completed",
        };

        f.debug_struct(type_name::<Self>())
            .field("value", self.value)
            .field("stage", &stage)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::pin::pin;
    use std::sync::Arc;
    use std::task::Waker;
    use std::thread;

    use futures::executor::block_on;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::test_utils::{PanicsOnFirstClone, with_watchdog};

    #[test]
    fn resolved_value_completes_on_first_poll() {
        let value = EventualValue::new();
        value.set(11);

        let mut wait = pin!(value.wait());
        let mut cx = Context::from_waker(Waker::noop());

        assert_eq!(wait.as_mut().poll(&mut cx), Poll::Ready(Some(11)));
        assert_eq!(value.registered_waiters(), 0);
    }

    #[test]
    fn canceled_value_completes_with_none() {
        let value = EventualValue::<i32>::new();
        value.cancel();

        assert_eq!(block_on(value.wait()), None);
    }

    #[test]
    fn pending_wait_registers_once() {
        let value = EventualValue::<i32>::new();

        let mut wait = pin!(value.wait());
        let mut cx = Context::from_waker(Waker::noop());

        assert_eq!(wait.as_mut().poll(&mut cx), Poll::Pending);
        assert_eq!(wait.as_mut().poll(&mut cx), Poll::Pending);
        assert_eq!(value.registered_waiters(), 1);

        value.set(5);

        assert_eq!(wait.as_mut().poll(&mut cx), Poll::Ready(Some(5)));
        assert_eq!(value.registered_waiters(), 0);
    }

    #[test]
    fn cancel_completes_pending_wait() {
        let value = EventualValue::<i32>::new();

        let mut wait = pin!(value.wait());
        let mut cx = Context::from_waker(Waker::noop());

        assert_eq!(wait.as_mut().poll(&mut cx), Poll::Pending);

        value.cancel();

        assert_eq!(wait.as_mut().poll(&mut cx), Poll::Ready(None));
    }

    #[test]
    fn dropping_pending_wait_withdraws_registration() {
        let value = EventualValue::<i32>::new();

        {
            let mut wait = pin!(value.wait());
            let mut cx = Context::from_waker(Waker::noop());

            assert_eq!(wait.as_mut().poll(&mut cx), Poll::Pending);
            assert_eq!(value.registered_waiters(), 1);
        }

        assert_eq!(value.registered_waiters(), 0);
    }

    #[test]
    fn dropping_unpolled_wait_is_harmless() {
        let value = EventualValue::<i32>::new();

        drop(value.wait());

        assert_eq!(value.registered_waiters(), 0);
    }

    #[test]
    #[should_panic(expected = "Wait polled after completion")]
    fn poll_after_completion_panics() {
        let value = EventualValue::new();
        value.set(1);

        let mut wait = pin!(value.wait());
        let mut cx = Context::from_waker(Waker::noop());

        _ = wait.as_mut().poll(&mut cx);
        _ = wait.as_mut().poll(&mut cx);
    }

    #[test]
    fn set_from_other_thread_wakes_wait() {
        with_watchdog(|| {
            let value = Arc::new(EventualValue::new());

            let producer = thread::spawn({
                let value = Arc::clone(&value);
                move || {
                    while value.registered_waiters() == 0 {
                        thread::yield_now();
                    }

                    value.set("from producer".to_string());
                }
            });

            let received = block_on(value.wait());
            producer.join().unwrap();

            assert_eq!(received.as_deref(), Some("from producer"));
        });
    }

    #[test]
    fn panicking_clone_during_delivery_completes_with_value() {
        let value = Arc::new(EventualValue::new());

        let mut wait = pin!(value.wait());
        let mut cx = Context::from_waker(Waker::noop());

        assert!(wait.as_mut().poll(&mut cx).is_pending());

        let payload = PanicsOnFirstClone::new(9);
        payload.arm();

        let setter = thread::spawn({
            let value = Arc::clone(&value);
            move || value.set(payload)
        });
        assert!(setter.join().is_err());

        let Poll::Ready(received) = wait.as_mut().poll(&mut cx) else {
            panic!("mailbox was closed, so the wait must be complete");
        };
        assert_eq!(received.map(|payload| payload.number), Some(9));
    }

    #[test]
    fn debug_shows_stage() {
        let value = EventualValue::<i32>::new();
        let wait = value.wait();

        assert!(format!("{wait:?}").contains("unregistered"));
    }

    #[test]
    fn thread_safe_types() {
        assert_impl_all!(Wait<'_, i32>: Send, Unpin);
    }
}
