#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Single-assignment values that any number of readers can wait for.
//!
//! An [`EventualValue<T>`] starts out empty. A producer resolves it exactly once, either by
//! [setting][EventualValue::set] a value or by [canceling][EventualValue::cancel] it. Readers
//! call [`get()`][EventualValue::get] with a [`Timeout`] and block until the value is resolved
//! or the timeout elapses, without polling.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! use eventual::EventualValue;
//!
//! let value = Arc::new(EventualValue::new());
//!
//! let producer = thread::spawn({
//!     let value = Arc::clone(&value);
//!     move || {
//!         thread::sleep(Duration::from_millis(20));
//!         value.set("hi");
//!     }
//! });
//!
//! // Too impatient - the producer is still sleeping.
//! assert_eq!(value.get(Duration::from_millis(1)), None);
//!
//! // Patient enough.
//! assert_eq!(value.get(Duration::from_secs(10)), Some("hi"));
//! # producer.join().unwrap();
//! ```
//!
//! # Resolution rules
//!
//! * The first resolution wins. Setting a value that is already set or canceled has no effect,
//!   and neither does canceling a value that is already set. Every reader therefore observes the
//!   same outcome, no matter how often it asks.
//! * Canceling releases all waiting readers at once, and every later read returns [`None`]
//!   without waiting.
//! * A timeout only affects the read that specified it.
//!
//! [`try_get()`][EventualValue::try_get] and [`try_set()`][EventualValue::try_set] report
//! why a read or write did not succeed, for callers that care.
//!
//! # Waiting policies
//!
//! [`Timeout::Immediate`] (or [`Duration::ZERO`][std::time::Duration::ZERO]) never waits,
//! [`Timeout::Bounded`] waits up to a duration and [`Timeout::Unbounded`] waits until the value
//! is resolved. Async code can instead await [`EventualValue::wait()`].
//!
//! # Getters
//!
//! Code that only needs to read a value can accept any [`Getter`], which both eventual values
//! and [`constant_getter()`] implement.
//!
//! # Performance
//!
//! Once a value is resolved, reads are a single atomic load plus a clone of the value. Only reads
//! that find the value unresolved take a lock, to register a one-shot mailbox that the resolution
//! fills (or closes) later.
//!
//! # Metrics
//!
//! Reads and resolutions are recorded as [`nm`] events named `eventual_*`. Use
//! [`nm::Report::collect()`] to inspect them.

mod constants;
mod error;
mod getter;
mod metrics;
mod state;
mod timeout;
mod value;
mod wait;

#[cfg(test)]
mod test_utils;

pub use error::*;
pub use getter::*;
pub use timeout::*;
pub use value::EventualValue;
pub use wait::*;
