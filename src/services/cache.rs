// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cache Coordinator: session-scoped copies of backend-owned data.
//!
//! Entries are stamped with the generation they were fetched in.
//! `clear_all` advances the generation, so a fetch that straddles a
//! session change can never surface in the new session. Each key also
//! carries a version that `invalidate` advances, so a fetch that
//! straddles a write to the same resource is returned but not kept.

use crate::error::Result;
use dashmap::DashMap;
use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Logical resource a cached value belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The current user's profile
    Profile,
    /// Any other named query
    Query(String),
}

#[derive(Clone)]
struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    generation: u64,
    stale: bool,
}

/// Shared per-key fetch locks, like the per-user refresh locks used for tokens.
type FetchLocks = DashMap<CacheKey, Arc<Mutex<()>>>;

#[derive(Default)]
struct CacheInner {
    entries: DashMap<CacheKey, CacheEntry>,
    fetch_locks: FetchLocks,
    /// Per-key invalidation count since the last clear.
    versions: DashMap<CacheKey, u64>,
    generation: AtomicU64,
}

/// Derived-data cache, cleared on every session transition.
#[derive(Clone, Default)]
pub struct CacheCoordinator {
    inner: Arc<CacheInner>,
}

impl CacheCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Fresh value for `key`, if any.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &CacheKey) -> Option<T> {
        self.lookup(key, false)
    }

    /// Value for `key` even if it has been invalidated.
    pub fn peek<T: Clone + Send + Sync + 'static>(&self, key: &CacheKey) -> Option<T> {
        self.lookup(key, true)
    }

    fn lookup<T: Clone + Send + Sync + 'static>(&self, key: &CacheKey, allow_stale: bool) -> Option<T> {
        let generation = self.generation();
        let entry = self.inner.entries.get(key)?;
        if entry.generation != generation || (entry.stale && !allow_stale) {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    fn version(&self, key: &CacheKey) -> u64 {
        self.inner.versions.get(key).map_or(0, |v| *v)
    }

    pub fn insert<T: Send + Sync + 'static>(&self, key: CacheKey, value: T) {
        let version = self.version(&key);
        self.insert_at(key, value, self.generation(), version);
    }

    fn insert_at<T: Send + Sync + 'static>(
        &self,
        key: CacheKey,
        value: T,
        generation: u64,
        version: u64,
    ) {
        if generation != self.generation() {
            tracing::debug!(?key, "Discarding value fetched before a cache clear");
            return;
        }
        if version != self.version(&key) {
            tracing::debug!(?key, "Discarding value fetched before an invalidation");
            return;
        }
        self.inner.entries.insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                generation,
                stale: false,
            },
        );
    }

    /// Mark `key` stale so the next read fetches again.
    ///
    /// Fetches for `key` already in flight will not be cached.
    pub fn invalidate(&self, key: &CacheKey) {
        *self.inner.versions.entry(key.clone()).or_insert(0) += 1;
        if let Some(mut entry) = self.inner.entries.get_mut(key) {
            entry.stale = true;
            tracing::debug!(?key, "Cache entry invalidated");
        }
    }

    /// Drop every cached value.
    pub fn clear_all(&self) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.entries.clear();
        self.inner.versions.clear();
        self.inner.fetch_locks.clear();
        tracing::debug!(generation, "Cache cleared");
    }

    /// Return the fresh cached value or run `fetch` and cache its result.
    ///
    /// Concurrent callers for the same key share one fetch.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let lock = self
            .inner
            .fetch_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another task may have fetched while we waited.
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let generation = self.generation();
        let version = self.version(&key);
        let value = fetch().await?;
        self.insert_at(key, value.clone(), generation, version);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_fetch_once_then_serve_from_cache() {
        let cache = CacheCoordinator::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_fetch(CacheKey::Profile, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, AppError>(42u32)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch_but_peek_sees_old() {
        let cache = CacheCoordinator::new();
        cache.insert(CacheKey::Profile, "old".to_string());
        cache.invalidate(&CacheKey::Profile);

        assert_eq!(cache.get::<String>(&CacheKey::Profile), None);
        assert_eq!(cache.peek::<String>(&CacheKey::Profile).as_deref(), Some("old"));

        let fresh = cache
            .get_or_fetch(CacheKey::Profile, || async { Ok("new".to_string()) })
            .await
            .unwrap();
        assert_eq!(fresh, "new");
        assert_eq!(cache.get::<String>(&CacheKey::Profile).as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_clear_all_discards_everything() {
        let cache = CacheCoordinator::new();
        cache.insert(CacheKey::Profile, 1u8);
        cache.insert(CacheKey::Query("courts".to_string()), 2u8);

        cache.clear_all();

        assert_eq!(cache.peek::<u8>(&CacheKey::Profile), None);
        assert_eq!(cache.peek::<u8>(&CacheKey::Query("courts".to_string())), None);
    }

    #[tokio::test]
    async fn test_fetch_straddling_clear_is_not_cached() {
        let cache = CacheCoordinator::new();
        let during = cache.clone();

        let value = cache
            .get_or_fetch(CacheKey::Profile, || async move {
                during.clear_all();
                Ok::<_, AppError>("previous session".to_string())
            })
            .await
            .unwrap();

        assert_eq!(value, "previous session");
        assert_eq!(cache.get::<String>(&CacheKey::Profile), None);
    }

    #[tokio::test]
    async fn test_fetch_straddling_invalidate_is_not_cached() {
        let cache = CacheCoordinator::new();
        let during = cache.clone();

        // Nothing is cached yet when the write lands.
        let value = cache
            .get_or_fetch(CacheKey::Profile, || async move {
                during.invalidate(&CacheKey::Profile);
                Ok::<_, AppError>("before save".to_string())
            })
            .await
            .unwrap();

        assert_eq!(value, "before save");
        assert_eq!(cache.peek::<String>(&CacheKey::Profile), None);

        let fresh = cache
            .get_or_fetch(CacheKey::Profile, || async { Ok("after save".to_string()) })
            .await
            .unwrap();
        assert_eq!(fresh, "after save");
        assert_eq!(cache.get::<String>(&CacheKey::Profile).as_deref(), Some("after save"));
    }

    #[tokio::test]
    async fn test_clear_all_releases_fetch_state() {
        let cache = CacheCoordinator::new();
        for name in ["courts", "players"] {
            let key = CacheKey::Query(name.to_string());
            cache
                .get_or_fetch(key.clone(), || async { Ok::<_, AppError>(1u8) })
                .await
                .unwrap();
            cache.invalidate(&key);
        }
        assert_eq!(cache.inner.fetch_locks.len(), 2);
        assert_eq!(cache.inner.versions.len(), 2);

        cache.clear_all();

        assert!(cache.inner.fetch_locks.is_empty());
        assert!(cache.inner.versions.is_empty());
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = CacheCoordinator::new();
        let err = cache
            .get_or_fetch::<u8, _, _>(CacheKey::Profile, || async {
                Err(AppError::NotFound("profile not found".to_string()))
            })
            .await;
        assert!(matches!(err, Err(AppError::NotFound(_))));
        assert_eq!(cache.peek::<u8>(&CacheKey::Profile), None);
    }

    #[test]
    fn test_type_mismatch_is_a_miss() {
        let cache = CacheCoordinator::new();
        cache.insert(CacheKey::Profile, 7u32);
        assert_eq!(cache.get::<String>(&CacheKey::Profile), None);
    }
}
