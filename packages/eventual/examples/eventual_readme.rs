//! Example used in crate-level documentation. See docs for description.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use eventual::{EventualValue, GetError};

fn main() {
    let value = Arc::new(EventualValue::new());

    let producer = thread::spawn({
        let value = Arc::clone(&value);
        move || {
            thread::sleep(Duration::from_millis(20));
            value.set("hi".to_string());
        }
    });

    match value.try_get(Duration::from_millis(10)) {
        Ok(message) => println!("Got {message} early"),
        Err(GetError::TimedOut) => println!("Nothing yet after 10 ms"),
        Err(error) => println!("Gave up: {error}"),
    }

    match value.get(Duration::from_secs(1)) {
        Some(message) => println!("Got {message}"),
        None => println!("Still nothing after a second"),
    }

    producer.join().expect("producer thread panicked");

    // Late writes are ignored; the first value stays.
    value.set("bye".to_string());
    println!("Value is still {:?}", value.get(Duration::ZERO));
}
