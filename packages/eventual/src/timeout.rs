use std::time::{Duration, Instant};

/// How long a read of an [`EventualValue`][crate::EventualValue] is willing to wait for the value
/// to be resolved.
///
/// A plain [`Duration`] converts into a `Timeout`, with [`Duration::ZERO`] meaning
/// [`Timeout::Immediate`]. An `Option<Duration>` also converts, with [`None`] meaning
/// [`Timeout::Unbounded`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use eventual::Timeout;
///
/// assert_eq!(Timeout::from(Duration::ZERO), Timeout::Immediate);
/// assert_eq!(
///     Timeout::from(Duration::from_millis(5)),
///     Timeout::Bounded(Duration::from_millis(5))
/// );
/// assert_eq!(Timeout::from(None), Timeout::Unbounded);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the three waiting policies are the complete set by definition"
)]
pub enum Timeout {
    /// Do not wait. If the value is not already resolved, the read fails immediately.
    Immediate,

    /// Wait up to the given duration for the value to be resolved.
    Bounded(Duration),

    /// Wait until the value is resolved, however long that takes.
    Unbounded,
}

impl Timeout {
    /// Converts the timeout into an absolute deadline measured from `now`.
    ///
    /// Returns `None` if the wait has no deadline - either because it is unbounded or because the
    /// duration is so large that the deadline is not representable. `Immediate` and a zero
    /// duration both produce `now` itself.
    pub(crate) fn deadline_from(self, now: Instant) -> Option<Instant> {
        match self {
            Self::Immediate => Some(now),
            Self::Bounded(duration) => now.checked_add(duration),
            Self::Unbounded => None,
        }
    }

    /// Whether this timeout forbids waiting at all.
    pub(crate) fn is_immediate(self) -> bool {
        match self {
            Self::Immediate => true,
            Self::Bounded(duration) => duration.is_zero(),
            Self::Unbounded => false,
        }
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        if duration.is_zero() {
            Self::Immediate
        } else {
            Self::Bounded(duration)
        }
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(duration: Option<Duration>) -> Self {
        duration.map_or(Self::Unbounded, Self::from)
    }
}
