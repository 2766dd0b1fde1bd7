//! Client pool
//!
//! Caches live HTTP client handles per (vendor, credential, endpoint) key so
//! repeated completions reuse connection keep-alives instead of rebuilding a
//! client per call. Each vendor has its own independent bounded cache: a
//! burst of credentials for one vendor can never evict another vendor's
//! entries. Eviction is least-recently-used on overflow plus a sliding idle
//! TTL.
//!
//! The pool hands out `Arc<ClientHandle>` shared references, not scoped
//! leases. Evicting an entry only drops the pool's own `Arc`; a call in
//! flight on a clone keeps the handle alive until it finishes. The internal
//! lock is held only for map bookkeeping and never across an await.

use crate::credential::{ProviderCredential, Vendor};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Pool configuration knobs.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum cached clients per vendor before LRU eviction kicks in.
    pub max_clients_per_vendor: usize,
    /// Idle time after which an untouched entry is evicted.
    pub idle_ttl: Duration,
    /// Request timeout applied to constructed HTTP clients.
    pub request_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_clients_per_vendor: 8,
            idle_ttl: Duration::from_secs(300),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// A pooled vendor client handle.
#[derive(Debug)]
pub struct ClientHandle {
    /// Underlying HTTP client (cheap to clone, safe for concurrent reuse)
    pub http: reqwest::Client,
    /// When this handle was constructed
    pub created_at: Instant,
}

struct PoolEntry {
    handle: Arc<ClientHandle>,
    last_used: Instant,
}

/// Bounded, TTL-evicting cache of vendor client handles.
#[derive(Debug)]
pub struct ClientPool {
    config: PoolConfig,
    caches: Mutex<HashMap<Vendor, HashMap<String, PoolEntry>>>,
}

impl std::fmt::Debug for PoolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolEntry")
            .field("last_used", &self.last_used)
            .finish()
    }
}

impl Default for ClientPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl ClientPool {
    /// Create a pool with the given configuration.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            caches: Mutex::new(HashMap::new()),
        }
    }

    /// Get or construct the client handle for a credential.
    ///
    /// A cache hit refreshes the entry's last-used timestamp (sliding TTL).
    /// A miss constructs a new client, stores it, and evicts the
    /// least-recently-used entry if the vendor's cache is over capacity.
    pub fn acquire(&self, credential: &ProviderCredential) -> Arc<ClientHandle> {
        let key = credential.pool_key();
        let now = Instant::now();

        let mut caches = self.caches.lock().unwrap_or_else(|e| e.into_inner());
        let cache = caches.entry(credential.vendor).or_default();

        // Drop entries idle past the TTL before looking up or inserting.
        let ttl = self.config.idle_ttl;
        cache.retain(|_, entry| now.duration_since(entry.last_used) < ttl);

        if let Some(entry) = cache.get_mut(&key) {
            entry.last_used = now;
            return Arc::clone(&entry.handle);
        }

        debug!(vendor = %credential.vendor, "constructing pooled client");
        let handle = Arc::new(ClientHandle {
            http: build_http_client(self.config.request_timeout),
            created_at: now,
        });
        cache.insert(
            key,
            PoolEntry {
                handle: Arc::clone(&handle),
                last_used: now,
            },
        );

        if cache.len() > self.config.max_clients_per_vendor {
            evict_lru(cache);
        }

        handle
    }

    /// Number of cached handles for a vendor.
    #[must_use]
    pub fn len(&self, vendor: Vendor) -> usize {
        let caches = self.caches.lock().unwrap_or_else(|e| e.into_inner());
        caches.get(&vendor).map_or(0, HashMap::len)
    }

    /// Whether the pool currently holds an entry for this credential.
    #[must_use]
    pub fn contains(&self, credential: &ProviderCredential) -> bool {
        let caches = self.caches.lock().unwrap_or_else(|e| e.into_inner());
        caches
            .get(&credential.vendor)
            .is_some_and(|cache| cache.contains_key(&credential.pool_key()))
    }
}

/// Remove the least-recently-touched entry (not the oldest-inserted one).
fn evict_lru(cache: &mut HashMap<String, PoolEntry>) {
    let lru_key = cache
        .iter()
        .min_by_key(|(_, entry)| entry.last_used)
        .map(|(key, _)| key.clone());

    if let Some(key) = lru_key {
        debug!(key = %key, "evicting least-recently-used pooled client");
        cache.remove(&key);
    }
}

fn build_http_client(timeout: Duration) -> reqwest::Client {
    // Builder failure falls back to the default client.
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn cred(vendor: Vendor, key: &str) -> ProviderCredential {
        ProviderCredential::new(vendor, key)
    }

    #[test]
    fn test_acquire_is_idempotent() {
        let pool = ClientPool::default();
        let credential = cred(Vendor::Anthropic, "sk-a");

        let first = pool.acquire(&credential);
        let second = pool.acquire(&credential);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pool.len(Vendor::Anthropic), 1);
    }

    #[test]
    fn test_distinct_keys_get_distinct_handles() {
        let pool = ClientPool::default();
        let a = pool.acquire(&cred(Vendor::OpenAi, "sk-1"));
        let b = pool.acquire(&cred(Vendor::OpenAi, "sk-2"));

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(Vendor::OpenAi), 2);
    }

    #[test]
    fn test_vendor_caches_are_independent() {
        let pool = ClientPool::new(PoolConfig {
            max_clients_per_vendor: 1,
            ..PoolConfig::default()
        });

        pool.acquire(&cred(Vendor::OpenAi, "sk-1"));
        pool.acquire(&cred(Vendor::Anthropic, "sk-2"));
        pool.acquire(&cred(Vendor::Anthropic, "sk-3"));

        // Anthropic overflow must not touch the OpenAI cache.
        assert_eq!(pool.len(Vendor::OpenAi), 1);
        assert_eq!(pool.len(Vendor::Anthropic), 1);
    }

    #[test]
    fn test_lru_eviction_respects_recent_touch() {
        let pool = ClientPool::new(PoolConfig {
            max_clients_per_vendor: 2,
            ..PoolConfig::default()
        });

        let first = cred(Vendor::Gemini, "sk-1");
        let second = cred(Vendor::Gemini, "sk-2");
        let third = cred(Vendor::Gemini, "sk-3");

        pool.acquire(&first);
        sleep(Duration::from_millis(5));
        pool.acquire(&second);
        sleep(Duration::from_millis(5));
        // Touch the oldest-inserted key so it becomes most recently used.
        pool.acquire(&first);
        sleep(Duration::from_millis(5));
        pool.acquire(&third);

        // `second` was least recently touched, so it goes, not `first`.
        assert!(pool.contains(&first));
        assert!(!pool.contains(&second));
        assert!(pool.contains(&third));
    }

    #[test]
    fn test_ttl_eviction_is_sliding() {
        let pool = ClientPool::new(PoolConfig {
            idle_ttl: Duration::from_millis(40),
            ..PoolConfig::default()
        });
        let credential = cred(Vendor::Ollama, "");

        let original = pool.acquire(&credential);
        sleep(Duration::from_millis(25));
        // Touch refreshes the TTL window.
        let touched = pool.acquire(&credential);
        assert!(Arc::ptr_eq(&original, &touched));

        sleep(Duration::from_millis(25));
        // Still inside the refreshed window.
        let again = pool.acquire(&credential);
        assert!(Arc::ptr_eq(&original, &again));

        sleep(Duration::from_millis(60));
        // Past the TTL now; a fresh handle is constructed.
        let fresh = pool.acquire(&credential);
        assert!(!Arc::ptr_eq(&original, &fresh));
    }

    #[test]
    fn test_evicted_handle_survives_while_borrowed() {
        let pool = ClientPool::new(PoolConfig {
            max_clients_per_vendor: 1,
            ..PoolConfig::default()
        });

        let borrowed = pool.acquire(&cred(Vendor::OpenAi, "sk-1"));
        pool.acquire(&cred(Vendor::OpenAi, "sk-2")); // evicts sk-1

        assert!(!pool.contains(&cred(Vendor::OpenAi, "sk-1")));
        // The in-flight reference still works; only the pool's Arc was dropped.
        assert!(Arc::strong_count(&borrowed) >= 1);
        let _ = borrowed.http.clone();
    }
}
