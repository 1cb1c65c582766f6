use thiserror::Error;

/// Explains why [`EventualValue::try_get()`][crate::EventualValue::try_get] did not return a
/// value.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum GetError {
    /// The value was canceled before it was ever set, so no value is coming.
    #[error("eventual value was canceled before a value was set")]
    Canceled,

    /// The timeout elapsed (or was zero) before the value was resolved.
    #[error("timed out waiting for eventual value")]
    TimedOut,
}

/// Explains why [`EventualValue::try_set()`][crate::EventualValue::try_set] did not store the
/// value, handing the rejected value back to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SetError<T> {
    /// A value had already been set. The first value set is the one readers observe.
    #[error("eventual value has already been set")]
    AlreadySet(T),

    /// The value had already been canceled. A canceled value can never be set.
    #[error("eventual value has been canceled")]
    Canceled(T),
}

impl<T> SetError<T> {
    /// Returns the value that was rejected.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::AlreadySet(value) | Self::Canceled(value) => value,
        }
    }
}
