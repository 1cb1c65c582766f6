//! Helpers shared by the unit tests of this crate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

/// Runs a test on a separate thread and panics if it has not finished within a deadline.
///
/// Most tests here block on eventual values, so a bug in the wakeup logic shows up as a hang
/// rather than a failure. The watchdog turns such a hang into a test failure.
///
/// Setting `MUTATION_TESTING=1` runs the test inline without a deadline, so that mutation testing
/// can observe the hang itself.
pub(crate) fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    // Miri is far slower at thread synchronization, so it gets more time.
    let deadline = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    let (tx, rx) = mpsc::channel();

    let test_thread = thread::spawn(move || {
        // If this fails, the watchdog has already given up on us.
        drop(tx.send(test_fn()));
    });

    match rx.recv_timeout(deadline) {
        Ok(result) => {
            test_thread.join().expect("test thread should not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test did not finish within {deadline:?} - a reader is probably stuck waiting");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_thread.join() {
            Ok(()) => panic!("test thread exited without reporting a result"),
            Err(panic) => std::panic::resume_unwind(panic),
        },
    }
}

/// A payload whose clone panics the first time it is cloned after being armed.
///
/// Used to check that a reader never mistakes an interrupted delivery for a cancellation.
#[derive(Debug)]
pub(crate) struct PanicsOnFirstClone {
    pub(crate) number: i32,
    armed: Arc<AtomicBool>,
}

impl PanicsOnFirstClone {
    pub(crate) fn new(number: i32) -> Self {
        Self {
            number,
            armed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The next clone of this payload (or of any copy of it) panics; later clones succeed.
    pub(crate) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl Clone for PanicsOnFirstClone {
    fn clone(&self) -> Self {
        assert!(
            !self.armed.swap(false, Ordering::SeqCst),
            "armed payload refused to be cloned"
        );

        Self {
            number: self.number,
            armed: Arc::clone(&self.armed),
        }
    }
}
