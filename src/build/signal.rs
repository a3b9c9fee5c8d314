//! Observable values.
//!
//! A [`Signal`] holds a current value. Each subscriber gets its own channel
//! that first receives the value current at subscription time and then every
//! later value in publish order. Closing the signal disconnects all channels.

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

#[derive(Debug)]
struct Inner<T> {
    value: T,
    subscribers: Vec<Sender<T>>,
    closed: bool,
}

#[derive(Debug)]
pub struct Signal<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Clone + Send> Signal<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Mutex::new(Inner {
                value: initial,
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.lock().value.clone()
    }

    /// Publishes `value`. Ignored once the signal is closed.
    pub fn set(&self, value: T) {
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }
        publish(&mut inner, value);
    }

    /// Atomically replaces the value with `f(current)` when it returns
    /// `Some`. Returns whether a value was published.
    pub fn try_update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> Option<T>,
    {
        let mut inner = self.inner.lock();
        if inner.closed {
            return false;
        }
        match f(&inner.value) {
            Some(next) => {
                publish(&mut inner, next);
                true
            }
            None => false,
        }
    }

    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = unbounded();
        let mut inner = self.inner.lock();
        if tx.send(inner.value.clone()).is_ok() && !inner.closed {
            inner.subscribers.push(tx);
        }
        rx
    }

    /// Disconnects every subscriber. The current value stays readable.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.subscribers.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

fn publish<T: Clone>(inner: &mut Inner<T>, value: T) {
    inner
        .subscribers
        .retain(|tx| tx.send(value.clone()).is_ok());
    inner.value = value;
}
