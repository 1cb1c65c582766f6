//! Lifecycle states of an eventual value.
//!
//! 0 - unset - nothing has happened yet; readers that want to wait must register a waiter.
//! 1 - set - a payload has been stored and every registered waiter has been handed over
//!           for delivery; terminal.
//! 2 - canceled - the value was canceled before any payload was stored; terminal.
//!
//! The state is only ever written while holding the waiter lock, and only away from `UNSET`.
//! Readers may load it without the lock (the fast path) but must use `Acquire` ordering, so that
//! observing `SET` also makes the stored payload visible.

pub(crate) const STATE_UNSET: u8 = 0;
pub(crate) const STATE_SET: u8 = 1;
pub(crate) const STATE_CANCELED: u8 = 2;

/// Human-readable name of a state, for diagnostics.
pub(crate) fn state_name(state: u8) -> &'static str {
    match state {
        STATE_UNSET => "unset",
        STATE_SET => "set",
        STATE_CANCELED => "canceled",
        _ => "invalid",
    }
}
