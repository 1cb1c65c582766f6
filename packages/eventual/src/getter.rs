use crate::{EventualValue, Timeout};

/// Anything that can be asked for a value with a [`Timeout`], the way
/// [`EventualValue::get()`] is.
///
/// This lets call sites accept either a real eventual value or a stand-in such as
/// [`constant_getter()`] for values that are known up front. Every
/// `Fn(Timeout) -> Option<T>` closure is a getter.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use eventual::{EventualValue, Getter, Timeout, constant_getter};
///
/// fn describe(getter: &dyn Getter<u32>) -> String {
///     match getter.get(Timeout::Bounded(Duration::from_millis(1))) {
///         Some(value) => format!("got {value}"),
///         None => "nothing yet".to_string(),
///     }
/// }
///
/// let pending = EventualValue::<u32>::new();
/// assert_eq!(describe(&pending), "nothing yet");
///
/// assert_eq!(describe(&constant_getter(5_u32)), "got 5");
/// ```
pub trait Getter<T> {
    /// Waits up to `timeout` for a value, returning [`None`] if none becomes available.
    fn get(&self, timeout: Timeout) -> Option<T>;
}

impl<T> Getter<T> for EventualValue<T>
where
    T: Clone,
{
    fn get(&self, timeout: Timeout) -> Option<T> {
        self.try_get(timeout).ok()
    }
}

impl<T, F> Getter<T> for F
where
    F: Fn(Timeout) -> Option<T>,
{
    fn get(&self, timeout: Timeout) -> Option<T> {
        self(timeout)
    }
}

/// Creates a getter that always returns a clone of `value`, whatever the timeout.
///
/// # Example
///
/// ```rust
/// use eventual::{Timeout, constant_getter};
///
/// let getter = constant_getter("fixed");
///
/// assert_eq!(getter(Timeout::Immediate), Some("fixed"));
/// assert_eq!(getter(Timeout::Unbounded), Some("fixed"));
/// ```
pub fn constant_getter<T>(value: T) -> impl Fn(Timeout) -> Option<T> + Clone
where
    T: Clone,
{
    move |_timeout| Some(value.clone())
}
