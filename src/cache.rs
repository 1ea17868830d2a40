//! Tenant-partitioned search-result cache.
//!
//! Bounded LRU with per-entry TTL and tenant-scoped invalidation. Entries
//! are replaced whole on re-insert, never merged. A tenant -> keys index is
//! maintained alongside the LRU so invalidating one tenant touches only
//! that tenant's entries; both live under one mutex so the capacity bound
//! and the index can never disagree. Critical sections are short and never
//! span an await.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex; // PERFORMANCE: Faster than std::sync::Mutex, no poisoning
use serde::Serialize;
use tracing::{debug, info};

use crate::cache_key::SearchKey;
use crate::context::TenantId;
use crate::models::SearchPage;

struct CachedPage {
    page: SearchPage,
    inserted_at: Instant,
}

struct CacheInner {
    entries: LruCache<SearchKey, CachedPage>,
    by_tenant: HashMap<TenantId, HashSet<SearchKey>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub size: usize,
}

#[derive(Clone)]
pub struct SearchCache {
    inner: Arc<Mutex<CacheInner>>,
    stats: Arc<Mutex<CacheStats>>,
    ttl: Duration,
}

impl SearchCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        info!(
            "Initializing search cache (capacity: {}, ttl: {:?})",
            capacity, ttl
        );
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: LruCache::new(capacity.max(1).try_into().unwrap()),
                by_tenant: HashMap::new(),
            })),
            stats: Arc::new(Mutex::new(CacheStats {
                hits: 0,
                misses: 0,
                hit_rate: 0.0,
                size: 0,
            })),
            ttl,
        }
    }

    /// Returns the cached page for `key` if present and not expired.
    ///
    /// A hit promotes the entry's recency. An expired entry is removed on
    /// observation and reported as a miss.
    pub fn get(&self, key: &SearchKey) -> Option<SearchPage> {
        let mut inner = self.inner.lock();
        let mut expired = false;
        let result = match inner.entries.get(key) {
            Some(entry) => {
                if entry.inserted_at.elapsed() < self.ttl {
                    Some(entry.page.clone())
                } else {
                    expired = true;
                    None
                }
            }
            None => None,
        };
        if expired {
            Self::remove_entry(&mut inner, key);
        }
        let size = inner.entries.len();
        drop(inner);

        if result.is_some() {
            debug!(key = %key, "search cache hit");
            self.update_stats(true, size);
        } else {
            if expired {
                debug!(key = %key, "search cache entry expired");
            }
            self.update_stats(false, size);
        }
        result
    }

    /// Inserts or wholly replaces the page for `key`, evicting the
    /// least-recently-used entry if the capacity is exceeded.
    pub fn put(&self, key: SearchKey, page: SearchPage) {
        let mut inner = self.inner.lock();
        let displaced = inner.entries.push(
            key.clone(),
            CachedPage {
                page,
                inserted_at: Instant::now(),
            },
        );
        // push returns the old value for the same key, or the LRU victim
        // when the insert overflowed capacity
        if let Some((victim, _)) = displaced {
            if victim != key {
                debug!(key = %victim, "search cache evicted lru entry");
                Self::unindex(&mut inner.by_tenant, &victim);
            }
        }
        inner
            .by_tenant
            .entry(key.tenant.clone())
            .or_default()
            .insert(key);
    }

    /// Drops every entry belonging to `tenant`. Other tenants' entries and
    /// their recency order are untouched.
    pub fn invalidate_tenant(&self, tenant: &TenantId) {
        let mut inner = self.inner.lock();
        let removed = match inner.by_tenant.remove(tenant) {
            Some(keys) => {
                let count = keys.len();
                for key in keys {
                    inner.entries.pop(&key);
                }
                count
            }
            None => 0,
        };
        drop(inner);
        if removed > 0 {
            debug!(tenant = %tenant, removed, "invalidated tenant search cache entries");
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove_entry(inner: &mut CacheInner, key: &SearchKey) {
        if inner.entries.pop(key).is_some() {
            Self::unindex(&mut inner.by_tenant, key);
        }
    }

    fn unindex(by_tenant: &mut HashMap<TenantId, HashSet<SearchKey>>, key: &SearchKey) {
        if let Some(keys) = by_tenant.get_mut(&key.tenant) {
            keys.remove(key);
            if keys.is_empty() {
                by_tenant.remove(&key.tenant);
            }
        }
    }

    fn update_stats(&self, hit: bool, size: usize) {
        let mut stats = self.stats.lock();
        if hit {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        stats.size = size;
        let total = stats.hits + stats.misses;
        stats.hit_rate = if total > 0 {
            stats.hits as f64 / total as f64
        } else {
            0.0
        };
    }
}
