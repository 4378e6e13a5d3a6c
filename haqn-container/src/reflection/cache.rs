//! Memoization of reflection results.
//!
//! A cache miss (`None` from [`ReflectionCache::fetch`]) is distinct from a
//! cached "nothing": a class without a constructor is stored as
//! `Cached::Constructor(None)` and still counts as found.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::trace;

use super::descriptor::{ClassDescriptor, FunctionDescriptor, Parameter};
use super::reflector::Lineage;
use crate::key::TypeName;

/// Prefix shared by every reflection cache key.
pub const KEY_PREFIX: &str = "haqn.refls.";

/// A cached reflection result.
#[derive(Debug, Clone)]
pub enum Cached {
    Class(Arc<ClassDescriptor>),
    Constructor(Option<Arc<FunctionDescriptor>>),
    Parameters(Option<Arc<[Parameter]>>),
    TypeHint(Option<TypeName>),
    Function(Arc<FunctionDescriptor>),
    Lineage(Arc<Lineage>),
}

/// Key/value store for reflection results.
pub trait ReflectionCache: Send + Sync {
    fn fetch(&self, key: &str) -> Option<Cached>;
    fn store(&self, key: &str, value: Cached);
}

/// Per-container cache. Entries live as long as the cache.
#[derive(Debug, Default)]
pub struct ArrayCache {
    entries: RwLock<HashMap<String, Cached>>,
}

impl ArrayCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ReflectionCache for ArrayCache {
    fn fetch(&self, key: &str) -> Option<Cached> {
        self.entries.read().get(key).cloned()
    }

    fn store(&self, key: &str, value: Cached) {
        self.entries.write().insert(key.to_string(), value);
    }
}

/// Process-wide cache whose entries expire.
#[derive(Debug)]
pub struct TtlCache {
    entries: DashMap<String, (Instant, Cached)>,
    time_to_live: RwLock<Duration>,
}

static GLOBAL_TTL_CACHE: Lazy<Arc<TtlCache>> = Lazy::new(|| Arc::new(TtlCache::default()));

impl TtlCache {
    pub const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(5);

    pub fn new(time_to_live: Duration) -> Self {
        let cache = Self::default();
        cache.set_time_to_live(time_to_live);
        cache
    }

    /// The cache shared by every injector in the process.
    pub fn global() -> Arc<TtlCache> {
        Arc::clone(&GLOBAL_TTL_CACHE)
    }

    /// Changes the lifetime of entries stored from now on. Zero is ignored.
    pub fn set_time_to_live(&self, time_to_live: Duration) {
        if !time_to_live.is_zero() {
            *self.time_to_live.write() = time_to_live;
        }
    }

    pub fn time_to_live(&self) -> Duration {
        *self.time_to_live.read()
    }

    /// Drops expired entries.
    pub fn purge(&self) {
        let now = Instant::now();
        self.entries.retain(|_, (expires, _)| *expires > now);
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            time_to_live: RwLock::new(Self::DEFAULT_TIME_TO_LIVE),
        }
    }
}

impl ReflectionCache for TtlCache {
    fn fetch(&self, key: &str) -> Option<Cached> {
        let hit = self.entries.get(key).and_then(|entry| {
            let (expires, value) = entry.value();
            (*expires > Instant::now()).then(|| value.clone())
        });

        if hit.is_none() {
            self.entries.remove_if(key, |_, (expires, _)| *expires <= Instant::now());
        }
        hit
    }

    fn store(&self, key: &str, value: Cached) {
        let expires = Instant::now() + self.time_to_live();
        self.entries.insert(key.to_string(), (expires, value));
    }
}

/// A fast local tier in front of a shared tier.
///
/// Hits in the shared tier are copied into the local one; stores write
/// through to both.
pub struct TieredCache {
    local: Arc<dyn ReflectionCache>,
    shared: Arc<dyn ReflectionCache>,
}

impl TieredCache {
    pub fn new(local: Arc<dyn ReflectionCache>, shared: Arc<dyn ReflectionCache>) -> Self {
        Self { local, shared }
    }

    /// A fresh [`ArrayCache`] in front of the global [`TtlCache`].
    pub fn with_global() -> Self {
        Self::new(Arc::new(ArrayCache::new()), TtlCache::global())
    }
}

impl ReflectionCache for TieredCache {
    fn fetch(&self, key: &str) -> Option<Cached> {
        if let Some(value) = self.local.fetch(key) {
            return Some(value);
        }

        let value = self.shared.fetch(key)?;
        trace!(key, "Reflection cache: shared tier hit");
        self.local.store(key, value.clone());
        Some(value)
    }

    fn store(&self, key: &str, value: Cached) {
        self.shared.store(key, value.clone());
        self.local.store(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_cache_keeps_found_nothing() {
        let cache = ArrayCache::new();
        assert!(cache.fetch("haqn.refls.ctors.plain").is_none());

        cache.store("haqn.refls.ctors.plain", Cached::Constructor(None));
        assert!(matches!(
            cache.fetch("haqn.refls.ctors.plain"),
            Some(Cached::Constructor(None))
        ));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn ttl_cache_expires_entries() {
        let cache = TtlCache::new(Duration::from_millis(20));
        cache.store("k", Cached::TypeHint(None));
        assert!(cache.fetch("k").is_some());

        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.fetch("k").is_none());
        assert!(cache.entries.is_empty());
    }

    #[test]
    fn ttl_cache_ignores_zero_lifetime() {
        let cache = TtlCache::default();
        cache.set_time_to_live(Duration::ZERO);
        assert_eq!(cache.time_to_live(), TtlCache::DEFAULT_TIME_TO_LIVE);
    }

    #[test]
    fn tiered_cache_repopulates_local_tier() {
        let local = Arc::new(ArrayCache::new());
        let shared = Arc::new(TtlCache::default());
        shared.store("k", Cached::TypeHint(Some(TypeName::new("Dep"))));

        let tiered = TieredCache::new(local.clone(), shared.clone());
        assert!(local.fetch("k").is_none());
        assert!(matches!(tiered.fetch("k"), Some(Cached::TypeHint(Some(_)))));
        assert!(local.fetch("k").is_some());

        tiered.store("other", Cached::Parameters(None));
        assert!(local.fetch("other").is_some());
        assert!(shared.fetch("other").is_some());
    }
}
