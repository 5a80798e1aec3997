//! Reload hub: the registry of live reload subscribers.
//!
//! Each browser connection owns a small bounded mailbox. Broadcast never
//! blocks: a subscriber that cannot keep up simply misses the signal and
//! recovers on its next reconnect.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::debug;

/// Mailbox depth per subscriber. Reload signals are tiny and idempotent,
/// so anything beyond a few slots is wasted.
const MAILBOX_CAPACITY: usize = 10;

/// What a subscriber mailbox can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadSignal {
    /// The site was rebuilt; refresh the page.
    Reload,
    /// The server is going down; close the stream.
    Shutdown,
}

/// One registered reload listener.
pub struct Subscriber {
    pub id: u64,
    pub rx: Receiver<ReloadSignal>,
}

/// Shared registry of reload subscribers.
#[derive(Default)]
pub struct ReloadHub {
    subscribers: Mutex<FxHashMap<u64, Sender<ReloadSignal>>>,
    next_id: AtomicU64,
}

impl ReloadHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and hand back its mailbox.
    pub fn register(&self) -> Subscriber {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = bounded(MAILBOX_CAPACITY);
        self.subscribers.lock().insert(id, tx);
        debug!("reload"; "subscriber {id} connected");
        Subscriber { id, rx }
    }

    /// Remove a subscriber. Safe to call more than once.
    pub fn unregister(&self, id: u64) {
        if self.subscribers.lock().remove(&id).is_some() {
            debug!("reload"; "subscriber {id} disconnected");
        }
    }

    /// Deliver a signal to every current subscriber without blocking.
    ///
    /// Returns how many mailboxes accepted the signal.
    pub fn broadcast(&self, signal: ReloadSignal) -> usize {
        // Snapshot under the lock, send outside it
        let targets: Vec<(u64, Sender<ReloadSignal>)> = self
            .subscribers
            .lock()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut delivered = 0;
        for (id, tx) in targets {
            match tx.try_send(signal) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!("reload"; "subscriber {id} mailbox full, dropping signal");
                }
                Err(TrySendError::Disconnected(_)) => {
                    self.unregister(id);
                }
            }
        }
        delivered
    }

    /// Wake every subscriber with a shutdown signal and clear the registry.
    pub fn shutdown(&self) {
        let drained = std::mem::take(&mut *self.subscribers.lock());
        for tx in drained.values() {
            let _ = tx.try_send(ReloadSignal::Shutdown);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_broadcast() {
        let hub = ReloadHub::new();
        let a = hub.register();
        let b = hub.register();
        assert_eq!(hub.subscriber_count(), 2);

        assert_eq!(hub.broadcast(ReloadSignal::Reload), 2);
        assert_eq!(a.rx.try_recv(), Ok(ReloadSignal::Reload));
        assert_eq!(b.rx.try_recv(), Ok(ReloadSignal::Reload));
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let hub = ReloadHub::new();
        let sub = hub.register();
        hub.unregister(sub.id);
        hub.unregister(sub.id);
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.broadcast(ReloadSignal::Reload), 0);
    }

    #[test]
    fn test_full_mailbox_does_not_block() {
        let hub = ReloadHub::new();
        let sub = hub.register();
        for _ in 0..MAILBOX_CAPACITY {
            assert_eq!(hub.broadcast(ReloadSignal::Reload), 1);
        }
        // Mailbox is full now; broadcast still returns immediately
        assert_eq!(hub.broadcast(ReloadSignal::Reload), 0);
        assert_eq!(hub.subscriber_count(), 1);
        drop(sub);
    }

    #[test]
    fn test_disconnected_subscriber_pruned() {
        let hub = ReloadHub::new();
        let sub = hub.register();
        drop(sub.rx);
        assert_eq!(hub.broadcast(ReloadSignal::Reload), 0);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_broadcast() {
        let hub = ReloadHub::new();
        hub.broadcast(ReloadSignal::Reload);
        let sub = hub.register();
        assert!(sub.rx.try_recv().is_err());
    }

    #[test]
    fn test_shutdown_wakes_and_clears() {
        let hub = ReloadHub::new();
        let a = hub.register();
        let b = hub.register();
        hub.shutdown();
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(a.rx.try_recv(), Ok(ReloadSignal::Shutdown));
        assert_eq!(b.rx.try_recv(), Ok(ReloadSignal::Shutdown));
    }
}
