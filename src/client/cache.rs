//! Key-addressed resource cache with stale-while-revalidate reads.
//!
//! One entry per [`ResourceKey`]; concurrent reads of a key share one fetch.
//! Entries publish their state through a `watch` channel, so subscribers see
//! every transition and a write followed by [`ResourceCache::invalidate`]
//! reaches all of them.

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use tokio::sync::watch;

use super::keys::ResourceKey;
use super::singleflight::{Singleflight, SingleflightGuard, Slot};
use super::transport::{Fetcher, TransportError};

pub type FetchResult = Result<Value, TransportError>;

/// Point-in-time view of one cache entry.
///
/// `version` increases whenever `data`, `error`, `is_loading` or
/// `is_validating` changes and never otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntrySnapshot {
    pub data: Option<Value>,
    pub error: Option<TransportError>,
    /// A fetch is running and no data has been received yet.
    pub is_loading: bool,
    /// A fetch is running.
    pub is_validating: bool,
    /// Invalidated and not yet refetched.
    pub stale: bool,
    pub version: u64,
}

struct Entry {
    state: watch::Sender<EntrySnapshot>,
    /// Bumped by every invalidation.
    generation: AtomicU64,
    /// One past the generation the last completed fetch for this entry
    /// started at; zero until a fetch lands here.
    fetched: AtomicU64,
}

impl Entry {
    fn new() -> Self {
        let (state, _rx) = watch::channel(EntrySnapshot {
            is_loading: true,
            is_validating: true,
            ..EntrySnapshot::default()
        });
        Self {
            state,
            generation: AtomicU64::new(0),
            fetched: AtomicU64::new(0),
        }
    }

    fn begin_validation(&self, stale: bool) {
        self.state.send_if_modified(|snapshot| {
            snapshot.stale |= stale;
            if snapshot.is_validating {
                return false;
            }
            snapshot.is_validating = true;
            snapshot.is_loading = snapshot.data.is_none();
            snapshot.version += 1;
            true
        });
    }

    fn finish(&self, result: &FetchResult) {
        self.state.send_if_modified(|snapshot| {
            let mut modified = snapshot.is_validating || snapshot.is_loading;
            snapshot.is_validating = false;
            snapshot.is_loading = false;

            match result {
                Ok(value) => {
                    snapshot.stale = false;
                    if snapshot.data.as_ref() != Some(value) {
                        snapshot.data = Some(value.clone());
                        modified = true;
                    }
                    if snapshot.error.take().is_some() {
                        modified = true;
                    }
                }
                Err(error) => {
                    if snapshot.error.as_ref() != Some(error) {
                        snapshot.error = Some(error.clone());
                        modified = true;
                    }
                }
            }

            if modified {
                snapshot.version += 1;
            }
            modified
        });
    }
}

struct CacheInner {
    fetcher: Arc<dyn Fetcher>,
    entries: DashMap<ResourceKey, Arc<Entry>>,
    flights: Singleflight<ResourceKey, FetchResult>,
}

/// Shared resource cache. Cloning is cheap and every clone sees the same
/// entries. Must be used from within a tokio runtime: reads and
/// invalidations spawn their fetches as tasks.
#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<CacheInner>,
}

impl ResourceCache {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                entries: DashMap::new(),
                flights: Singleflight::new(),
            }),
        }
    }

    /// Subscribe to a resource. The first subscription of a key starts its
    /// fetch; later ones reuse the entry. `None` yields an inactive handle
    /// that never fetches.
    pub fn use_resource(&self, key: Option<ResourceKey>) -> ResourceHandle {
        let Some(key) = key else {
            return ResourceHandle {
                key: None,
                cache: self.clone(),
                rx: None,
            };
        };

        let (entry, created) = self.entry(&key);
        let rx = entry.state.subscribe();
        if created {
            self.spawn_revalidate(key.clone(), entry);
        }

        ResourceHandle {
            key: Some(key),
            cache: self.clone(),
            rx: Some(rx),
        }
    }

    /// Mark `key` stale and refetch it in the background. Returns at once;
    /// subscribers observe `is_validating` immediately and the new data when
    /// the fetch lands. Keys nobody has read are left alone.
    pub fn invalidate(&self, key: &ResourceKey) -> bool {
        let Some(entry) = self.inner.entries.get(key).map(|e| e.value().clone()) else {
            return false;
        };

        entry.generation.fetch_add(1, Ordering::AcqRel);
        entry.begin_validation(true);
        tracing::debug!("Invalidated {}", key);
        self.spawn_revalidate(key.clone(), entry);
        true
    }

    /// Invalidate every cached key under `path`, whatever its query.
    pub fn invalidate_path(&self, path: &str) -> usize {
        self.invalidate_where(|key, _| key.path() == path)
    }

    /// Invalidate every cached key whose key and current state match.
    pub fn invalidate_where(&self, matches: impl Fn(&ResourceKey, &EntrySnapshot) -> bool) -> usize {
        let keys: Vec<ResourceKey> = self
            .inner
            .entries
            .iter()
            .filter(|e| matches(e.key(), &e.state.borrow()))
            .map(|e| e.key().clone())
            .collect();

        keys.iter().filter(|key| self.invalidate(key)).count()
    }

    /// Read `key` through the cache and wait for the result. Joins a fetch
    /// already in flight instead of starting another one.
    pub async fn fetch(&self, key: &ResourceKey) -> FetchResult {
        let (entry, _) = self.entry(key);
        self.revalidate(key.clone(), entry).await
    }

    pub fn snapshot(&self, key: &ResourceKey) -> Option<EntrySnapshot> {
        self.inner.entries.get(key).map(|e| e.state.borrow().clone())
    }

    /// Drop the entry for `key`. Existing handles keep their last state.
    pub fn evict(&self, key: &ResourceKey) -> bool {
        self.inner.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    fn entry(&self, key: &ResourceKey) -> (Arc<Entry>, bool) {
        match self.inner.entries.entry(key.clone()) {
            MapEntry::Occupied(e) => (e.get().clone(), false),
            MapEntry::Vacant(e) => {
                let entry = Arc::new(Entry::new());
                e.insert(entry.clone());
                (entry, true)
            }
        }
    }

    fn spawn_revalidate(&self, key: ResourceKey, entry: Arc<Entry>) {
        let cache = self.clone();
        tokio::spawn(async move {
            cache.revalidate(key, entry).await;
        });
    }

    /// Runs or joins the fetch for `key` until the entry holds a result at
    /// least as new as the latest invalidation seen on entry.
    async fn revalidate(&self, key: ResourceKey, entry: Arc<Entry>) -> FetchResult {
        let wanted = entry.generation.load(Ordering::Acquire);

        loop {
            match self.inner.flights.acquire(key.clone()) {
                Slot::Leader(tx) => {
                    let guard = SingleflightGuard::new(&self.inner.flights, key.clone());
                    entry.begin_validation(false);

                    let result = loop {
                        let generation = entry.generation.load(Ordering::Acquire);
                        let result = self.inner.fetcher.fetch(&key).await;
                        if entry.generation.load(Ordering::Acquire) == generation {
                            entry.fetched.store(generation + 1, Ordering::Release);
                            break result;
                        }
                        tracing::debug!("{} was invalidated during its fetch, fetching again", key);
                    };

                    if let Err(e) = &result {
                        tracing::warn!("Fetch of {} failed: {}", key, e);
                    }
                    entry.finish(&result);
                    guard.complete();
                    let _ = tx.send(result.clone());
                    return result;
                }
                Slot::Follower(mut rx) => match rx.recv().await {
                    Ok(result) if entry.fetched.load(Ordering::Acquire) > wanted => return result,
                    // Joined a fetch that started before our invalidation,
                    // one that filled an evicted entry, or its leader went away
                    _ => continue,
                },
            }
        }
    }
}

/// A subscription to one key. Dropping it stops updates but does not cancel
/// a fetch in flight.
pub struct ResourceHandle {
    key: Option<ResourceKey>,
    cache: ResourceCache,
    rx: Option<watch::Receiver<EntrySnapshot>>,
}

impl ResourceHandle {
    pub fn key(&self) -> Option<&ResourceKey> {
        self.key.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.key.is_some()
    }

    /// Current state; inactive handles are permanently idle and empty.
    pub fn snapshot(&self) -> EntrySnapshot {
        match &self.rx {
            Some(rx) => rx.borrow().clone(),
            None => EntrySnapshot::default(),
        }
    }

    pub fn version(&self) -> u64 {
        self.rx.as_ref().map(|rx| rx.borrow().version).unwrap_or(0)
    }

    /// Fire-and-forget revalidation of this handle's key.
    pub fn mutate(&self) {
        if let Some(key) = &self.key {
            self.cache.invalidate(key);
        }
    }

    /// Wait for the next state transition. Returns `false` when no further
    /// transition can happen: the handle is inactive or its entry is gone.
    pub async fn changed(&mut self) -> bool {
        match &mut self.rx {
            Some(rx) => rx.changed().await.is_ok(),
            None => false,
        }
    }

    /// Wait until no fetch is running for this key and return that state.
    pub async fn settled(&mut self) -> EntrySnapshot {
        if let Some(rx) = &mut self.rx {
            if let Ok(snapshot) = rx.wait_for(|s| !s.is_validating).await {
                return snapshot.clone();
            }
        }
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Counts fetches; optionally parks each one until released.
    struct CountingFetcher {
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
        fail: bool,
    }

    impl CountingFetcher {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: None,
                fail: false,
            })
        }

        fn gated(gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: Some(gate),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: None,
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch(&self, key: &ResourceKey) -> FetchResult {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(TransportError::Http {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(json!({ "path": key.path(), "call": call }))
        }
    }

    fn key(path: &str) -> ResourceKey {
        ResourceKey::new(path)
    }

    #[tokio::test]
    async fn test_first_read_loads_then_settles() {
        let fetcher = CountingFetcher::new();
        let cache = ResourceCache::new(fetcher.clone());

        let mut handle = cache.use_resource(Some(key("/a")));
        let initial = handle.snapshot();
        assert!(initial.is_loading);
        assert!(initial.is_validating);

        let settled = handle.settled().await;
        assert!(!settled.is_loading);
        assert!(!settled.is_validating);
        assert_eq!(settled.data, Some(json!({ "path": "/a", "call": 1 })));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_fetch() {
        let gate = Arc::new(Notify::new());
        let fetcher = CountingFetcher::gated(gate.clone());
        let cache = ResourceCache::new(fetcher.clone());

        let shared = key("/a");
        let mut first = cache.use_resource(Some(shared.clone()));
        let mut second = cache.use_resource(Some(shared.clone()));
        let (a, ()) = tokio::join!(cache.fetch(&shared), async {
            tokio::task::yield_now().await;
            gate.notify_one();
        });

        let a = a.unwrap();
        assert_eq!(first.settled().await.data, Some(a.clone()));
        assert_eq!(second.settled().await.data, Some(a));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_inactive_key_never_fetches() {
        let fetcher = CountingFetcher::new();
        let cache = ResourceCache::new(fetcher.clone());

        let mut handle = cache.use_resource(None);
        handle.mutate();
        assert!(!handle.changed().await);

        let snapshot = handle.snapshot();
        assert!(!snapshot.is_loading);
        assert!(snapshot.data.is_none());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fetcher.calls(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_refetches_and_keeps_old_data_meanwhile() {
        let fetcher = CountingFetcher::new();
        let cache = ResourceCache::new(fetcher.clone());

        let mut handle = cache.use_resource(Some(key("/a")));
        let first = handle.settled().await;
        assert_eq!(first.data, Some(json!({ "path": "/a", "call": 1 })));

        handle.mutate();
        let during = handle.snapshot();
        assert!(during.is_validating);
        assert!(!during.is_loading);
        assert!(during.stale);
        assert_eq!(during.data, first.data);

        let after = handle.settled().await;
        assert_eq!(after.data, Some(json!({ "path": "/a", "call": 2 })));
        assert!(!after.stale);
        assert!(after.version > first.version);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_during_fetch_fetches_again() {
        let gate = Arc::new(Notify::new());
        let fetcher = CountingFetcher::gated(gate.clone());
        let cache = ResourceCache::new(fetcher.clone());

        let mut handle = cache.use_resource(Some(key("/a")));
        tokio::task::yield_now().await;
        assert!(cache.invalidate(&key("/a")));

        // Release the first fetch, then the refetch it triggers
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;
        gate.notify_one();

        let settled = handle.settled().await;
        assert_eq!(settled.data, Some(json!({ "path": "/a", "call": 2 })));
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_stored_not_raised() {
        let fetcher = CountingFetcher::failing();
        let cache = ResourceCache::new(fetcher.clone());

        let mut handle = cache.use_resource(Some(key("/a")));
        let settled = handle.settled().await;
        assert!(settled.data.is_none());
        assert!(!settled.is_loading);
        assert_eq!(settled.error.and_then(|e| e.status()), Some(500));
    }

    #[tokio::test]
    async fn test_invalidate_path_matches_any_query() {
        let fetcher = CountingFetcher::new();
        let cache = ResourceCache::new(fetcher.clone());

        let mut page_one = cache.use_resource(Some(key("/comments/x").with_query("skip", 0)));
        let mut page_two = cache.use_resource(Some(key("/comments/x").with_query("skip", 20)));
        let mut other = cache.use_resource(Some(key("/comments/y")));
        page_one.settled().await;
        page_two.settled().await;
        other.settled().await;

        assert_eq!(cache.invalidate_path("/comments/x"), 2);
        page_one.settled().await;
        page_two.settled().await;
        assert_eq!(fetcher.calls(), 5);
    }

    #[tokio::test]
    async fn test_evict_forgets_entry() {
        let fetcher = CountingFetcher::new();
        let cache = ResourceCache::new(fetcher.clone());

        let mut handle = cache.use_resource(Some(key("/a")));
        handle.settled().await;
        assert!(cache.evict(&key("/a")));
        assert!(cache.snapshot(&key("/a")).is_none());
        assert!(!cache.invalidate(&key("/a")));
    }

    #[tokio::test]
    async fn test_entry_recreated_during_fetch_still_settles() {
        let gate = Arc::new(Notify::new());
        let fetcher = CountingFetcher::gated(gate.clone());
        let cache = ResourceCache::new(fetcher.clone());

        let _evicted = cache.use_resource(Some(key("/a")));
        tokio::task::yield_now().await;
        assert!(cache.evict(&key("/a")));

        let mut fresh = cache.use_resource(Some(key("/a")));
        tokio::task::yield_now().await;

        // The evicted entry's fetch lands, then the fresh entry's own fetch
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;
        gate.notify_one();

        let settled = tokio::time::timeout(Duration::from_millis(500), fresh.settled())
            .await
            .expect("fresh entry settles");
        assert!(!settled.is_loading);
        assert!(!settled.is_validating);
        assert_eq!(settled.data, Some(json!({ "path": "/a", "call": 2 })));
        assert_eq!(fetcher.calls(), 2);
    }
}
