//! Single-slot readiness signal.
//!
//! The server accepts calls before the database is usable. Callers check the
//! gate and get `None` until the background initializer publishes the
//! fully-initialized value, which happens exactly once.

use std::sync::Arc;

use tokio::sync::watch;

pub struct ReadinessGate<T> {
    slot: Arc<watch::Sender<Option<Arc<T>>>>,
}

impl<T> Clone for ReadinessGate<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for ReadinessGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReadinessGate<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { slot: Arc::new(tx) }
    }

    /// Store `value` if nothing has been published yet. Returns whether it
    /// was stored.
    pub fn publish(&self, value: T) -> bool {
        let mut value = Some(value);
        self.slot.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = value.take().map(Arc::new);
            true
        })
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Wait until a value is published.
    pub async fn wait(&self) -> Arc<T> {
        let mut rx = self.slot.subscribe();
        loop {
            if let Some(value) = rx.borrow_and_update().clone() {
                return value;
            }
            // The sender lives in `self`, so the channel never closes here.
            let _ = rx.changed().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_empty_until_published() {
        let gate: ReadinessGate<u32> = ReadinessGate::new();
        assert!(!gate.is_ready());
        assert!(gate.get().is_none());

        assert!(gate.publish(7));
        assert!(gate.is_ready());
        assert_eq!(*gate.get().unwrap(), 7);
    }

    #[test]
    fn test_publishes_once() {
        let gate = ReadinessGate::new();
        assert!(gate.publish("first"));
        assert!(!gate.publish("second"));
        assert_eq!(*gate.get().unwrap(), "first");
    }

    #[tokio::test]
    async fn test_clones_share_the_slot() {
        let gate: ReadinessGate<u64> = ReadinessGate::new();
        let reader = gate.clone();

        let waiter = tokio::spawn(async move { *reader.wait().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        gate.publish(42);

        let value = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_when_ready() {
        let gate = ReadinessGate::new();
        gate.publish(String::from("ready"));
        assert_eq!(gate.wait().await.as_str(), "ready");
    }
}
