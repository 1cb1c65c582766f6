// A poisoned lock means a thread panicked halfway through resolving a value or registering a
// waiter. The waiter collection may then be out of sync with the state flag, so we cannot keep
// promising exactly-once notification and must not continue.
pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - the waiter collection \
    of an eventual value can no longer be trusted to match its state";
