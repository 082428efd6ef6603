//! One-shot readiness gate between the initialization thread and lookups.

use std::sync::OnceLock;

use parking_lot::{Condvar, Mutex};

/// A value that is published exactly once and awaited by any number of
/// readers.
pub(crate) struct Gate<T> {
    value: OnceLock<T>,
    lock: Mutex<()>,
    ready: Condvar,
}

impl<T> Gate<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: OnceLock::new(),
            lock: Mutex::new(()),
            ready: Condvar::new(),
        }
    }

    /// Creates a gate that is already open.
    pub(crate) fn completed(value: T) -> Self {
        let gate = Self::new();
        let _ = gate.value.set(value);
        gate
    }

    /// Publishes the value and wakes every waiter. Only the first call has
    /// an effect.
    pub(crate) fn complete(&self, value: T) {
        let _guard = self.lock.lock();
        let _ = self.value.set(value);
        self.ready.notify_all();
    }

    /// Returns the value if it has been published.
    pub(crate) fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Blocks until the value is published.
    pub(crate) fn wait(&self) -> &T {
        if let Some(value) = self.value.get() {
            return value;
        }
        let mut guard = self.lock.lock();
        loop {
            if let Some(value) = self.value.get() {
                return value;
            }
            self.ready.wait(&mut guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn pending_until_completed() {
        let gate = Gate::new();
        assert!(gate.get().is_none());
        gate.complete(7);
        assert_eq!(gate.get(), Some(&7));
        assert_eq!(*gate.wait(), 7);
    }

    #[test]
    fn first_completion_wins() {
        let gate = Gate::completed("first");
        gate.complete("second");
        assert_eq!(*gate.wait(), "first");
    }

    #[test]
    fn waiters_are_released() {
        let gate = Arc::new(Gate::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                std::thread::spawn(move || *gate.wait())
            })
            .collect();

        std::thread::sleep(Duration::from_millis(20));
        gate.complete(42u32);

        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), 42);
        }
    }
}
