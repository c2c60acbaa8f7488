//! Write-once, read-many keyed caches.
//!
//! [`OnceMap`] holds one [`OnceCell`] per key. Concurrent callers that
//! miss on the same key share a single in-flight initialization instead
//! of each computing the value. Entries are never evicted; they live as
//! long as the owning session.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crime_lookup_police_models::{AggregateResult, LocationId, Period};
use tokio::sync::OnceCell;

/// Map of lazily initialized values.
#[derive(Debug)]
pub struct OnceMap<K, V> {
    cells: Mutex<BTreeMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for OnceMap<K, V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<K: Ord + Clone, V: Clone> OnceMap<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // The lock only guards map access and is never held across an await,
    // so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<K, Arc<OnceCell<V>>>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cell(&self, key: &K) -> Arc<OnceCell<V>> {
        Arc::clone(self.lock().entry(key.clone()).or_default())
    }

    /// Returns the value for `key` if it has been initialized.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).and_then(|cell| cell.get().cloned())
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&self, key: K, value: V) {
        self.lock()
            .insert(key, Arc::new(OnceCell::new_with(Some(value))));
    }

    /// Returns the value for `key`, running `init` to produce it on a miss.
    ///
    /// Concurrent calls for the same key wait on the first caller's
    /// `init` rather than running their own.
    pub async fn get_or_init<F, Fut>(&self, key: &K, init: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = self.cell(key);
        cell.get_or_init(init).await.clone()
    }

    /// Number of initialized entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().values().filter(|cell| cell.initialized()).count()
    }

    /// Whether no entry has been initialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all initialized entries in key order.
    #[must_use]
    pub fn entries(&self) -> Vec<(K, V)> {
        self.lock()
            .iter()
            .filter_map(|(key, cell)| cell.get().map(|value| (key.clone(), value.clone())))
            .collect()
    }
}

/// Key of a cached query result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    /// Canonical location identifier from the resolver.
    pub location_id: LocationId,
    /// Period the result covers.
    pub period: Period,
}

impl CacheKey {
    /// Creates a cache key.
    #[must_use]
    pub const fn new(location_id: LocationId, period: Period) -> Self {
        Self {
            location_id,
            period,
        }
    }
}

/// Aggregate results keyed by (location, period).
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: OnceMap<CacheKey, AggregateResult>,
}

impl QueryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored result for `key`.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<AggregateResult> {
        self.entries.get(key)
    }

    /// Stores `value` under `key`; a later `put` for the same key wins.
    pub fn put(&self, key: CacheKey, value: AggregateResult) {
        self.entries.put(key, value);
    }

    /// Returns the stored result for `key`, computing and storing it on a
    /// miss. Concurrent misses on the same key share one computation.
    pub async fn get_or_compute<F, Fut>(&self, key: &CacheKey, compute: F) -> AggregateResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AggregateResult>,
    {
        self.entries.get_or_init(key, compute).await
    }

    /// Number of stored results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all stored results.
    #[must_use]
    pub fn entries(&self) -> Vec<(CacheKey, AggregateResult)> {
        self.entries.entries()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crime_lookup_police_models::Coordinate;

    use super::*;

    fn result(location: &str, name: &str) -> AggregateResult {
        AggregateResult {
            location_id: LocationId::new(location),
            coordinate: Coordinate::new(51.5, -0.1),
            period: Period::new(2023),
            dominant_category_id: Some(name.to_lowercase().as_str().into()),
            dominant_category: name.to_string(),
            monthly_rate: 1.5,
        }
    }

    fn key(location: &str) -> CacheKey {
        CacheKey::new(LocationId::new(location), Period::new(2023))
    }

    #[test]
    fn get_on_empty_cache_is_absent() {
        let cache = QueryCache::new();
        assert_eq!(cache.get(&key("SW1A 1AA")), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn put_then_get_and_last_write_wins() {
        let cache = QueryCache::new();
        cache.put(key("SW1A 1AA"), result("SW1A 1AA", "Burglary"));
        cache.put(key("SW1A 1AA"), result("SW1A 1AA", "Drugs"));

        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get(&key("SW1A 1AA")).unwrap().dominant_category,
            "Drugs"
        );
    }

    #[test]
    fn keys_differ_by_period() {
        let cache = QueryCache::new();
        cache.put(key("SW1A 1AA"), result("SW1A 1AA", "Burglary"));

        let other_year = CacheKey::new(LocationId::new("SW1A 1AA"), Period::new(2022));
        assert_eq!(cache.get(&other_year), None);
    }

    #[tokio::test]
    async fn get_or_compute_runs_once_per_key() {
        let cache = QueryCache::new();
        let runs = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_compute(&key("SW1A 1AA"), || async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    result("SW1A 1AA", "Burglary")
                })
                .await;
            assert_eq!(value.dominant_category, "Burglary");
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_misses_share_one_computation() {
        let map: OnceMap<u32, u32> = OnceMap::new();
        let runs = AtomicUsize::new(0);

        let compute = || async {
            runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            7
        };

        let (a, b, c) = tokio::join!(
            map.get_or_init(&1, compute),
            map.get_or_init(&1, compute),
            map.get_or_init(&1, compute),
        );

        assert_eq!((a, b, c), (7, 7, 7));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn uninitialized_cells_are_not_counted() {
        let map: OnceMap<u32, u32> = OnceMap::new();
        let _ = map.cell(&1);
        assert!(map.is_empty());
        assert!(map.entries().is_empty());

        map.put(2, 20);
        assert_eq!(map.entries(), vec![(2, 20)]);
    }
}
