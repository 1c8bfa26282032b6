//! Coalesces concurrent fetches of the same key into one.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use tokio::sync::broadcast;

/// Result of trying to take the fetch slot for a key.
pub enum Slot<V> {
    /// No fetch was running: the caller performs it and broadcasts the result.
    Leader(broadcast::Sender<V>),
    /// A fetch is already running: wait for its result.
    Follower(broadcast::Receiver<V>),
}

pub struct Singleflight<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    in_flight: DashMap<K, broadcast::Sender<V>>,
}

impl<K, V> Singleflight<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            in_flight: DashMap::new(),
        }
    }

    /// Check-and-register through the entry API so two callers can never
    /// both become leader for one key.
    pub fn acquire(&self, key: K) -> Slot<V> {
        match self.in_flight.entry(key) {
            Entry::Occupied(entry) => Slot::Follower(entry.get().subscribe()),
            Entry::Vacant(entry) => {
                let (tx, _rx) = broadcast::channel(1);
                entry.insert(tx.clone());
                Slot::Leader(tx)
            }
        }
    }

    /// Unregister a finished fetch. Leaders call this before broadcasting,
    /// so every follower already subscribed receives the result and later
    /// callers start a fresh fetch.
    pub fn complete(&self, key: &K) {
        self.in_flight.remove(key);
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.contains_key(key)
    }
}

impl<K, V> Default for Singleflight<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Unregisters the key on drop if the leader never completed, e.g. when
/// its task was cancelled mid-fetch. Followers then see the channel close.
pub struct SingleflightGuard<'a, K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    singleflight: &'a Singleflight<K, V>,
    key: K,
    completed: bool,
}

impl<'a, K, V> SingleflightGuard<'a, K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(singleflight: &'a Singleflight<K, V>, key: K) -> Self {
        Self {
            singleflight,
            key,
            completed: false,
        }
    }

    pub fn complete(mut self) {
        self.singleflight.complete(&self.key);
        self.completed = true;
    }
}

impl<K, V> Drop for SingleflightGuard<'_, K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn drop(&mut self) {
        if !self.completed {
            self.singleflight.complete(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_caller_follows() {
        let flights: Singleflight<&str, u32> = Singleflight::new();

        let tx = match flights.acquire("a") {
            Slot::Leader(tx) => tx,
            Slot::Follower(_) => panic!("first caller must lead"),
        };
        let mut rx = match flights.acquire("a") {
            Slot::Follower(rx) => rx,
            Slot::Leader(_) => panic!("second caller must follow"),
        };

        flights.complete(&"a");
        tx.send(7).unwrap();
        assert_eq!(rx.recv().await.unwrap(), 7);
        assert!(matches!(flights.acquire("a"), Slot::Leader(_)));
    }

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let flights: Singleflight<&str, u32> = Singleflight::new();
        let tx = match flights.acquire("a") {
            Slot::Leader(tx) => tx,
            Slot::Follower(_) => panic!("first caller must lead"),
        };
        let mut rx = match flights.acquire("a") {
            Slot::Follower(rx) => rx,
            Slot::Leader(_) => panic!("second caller must follow"),
        };

        {
            let _guard = SingleflightGuard::new(&flights, "a");
        }
        assert!(!flights.is_in_flight(&"a"));

        drop(tx);
        assert!(rx.recv().await.is_err());
    }
}
