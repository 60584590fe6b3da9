//! Bounded TTL cache with single-flight coalescing (spec §4.1). Grounded on the teacher's
//! preference for `DashMap`-backed registries (`engine/mod.rs`'s `jobs`/`stats` maps) over a
//! single global `Mutex<HashMap<..>>`, and on `engine/bandwidth.rs`'s `Notify`-based waiter
//! coordination for the shape of `resolveOnce`'s coalescing.

use dashmap::mapref::entry::Entry as DashEntry;
use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

const MAX_RESOLVED: usize = 500;
const MAX_PENDING: usize = 100;

struct CachedEntry<V> {
  value: V,
  expires_at: Instant,
}

struct Pending<V: Clone> {
  waiters: AtomicUsize,
  tx: broadcast::Sender<Result<V, String>>,
}

/// `URLCache` from spec §4.1, generic over the resolved value type so it can back both the
/// obfuscated-link resolver (`String`) and any future resolved-value shape.
pub struct UrlCache<V: Clone + Send + Sync + 'static> {
  resolved: Mutex<LruCache<String, CachedEntry<V>>>,
  pending: DashMap<String, Arc<Pending<V>>>,
  pending_order: Mutex<std::collections::VecDeque<String>>,
}

impl<V: Clone + Send + Sync + 'static> UrlCache<V> {
  pub fn new() -> Self {
    Self {
      resolved: Mutex::new(LruCache::new(NonZeroUsize::new(MAX_RESOLVED).unwrap())),
      pending: DashMap::new(),
      pending_order: Mutex::new(std::collections::VecDeque::new()),
    }
  }

  /// Returns the stored value if present and not expired. Uses `peek` rather than `get` so a
  /// read never promotes an entry to most-recently-used — eviction stays insertion-ordered
  /// (FIFO-as-LRU), matching the cache-size invariant in spec §3.
  pub fn get(&self, key: &str) -> Option<V> {
    let mut guard = self.resolved.lock();
    match guard.peek(key) {
      Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
      Some(_) => {
        guard.pop(key);
        None
      }
      None => None,
    }
  }

  /// Inserts a value. At capacity, `LruCache::put` evicts the least-recently-touched entry,
  /// which — since `get` never promotes — is the oldest-inserted one.
  pub fn put(&self, key: &str, value: V, ttl: Duration) {
    let mut guard = self.resolved.lock();
    guard.put(
      key.to_string(),
      CachedEntry { value, expires_at: Instant::now() + ttl },
    );
  }

  /// `resolveOnce` (spec §4.1): cached hit returns immediately; a call already in flight for
  /// `key` is awaited and shares its result; otherwise this call becomes the fetcher.
  pub async fn resolve_once<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<V, String>
  where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<V, String>>,
  {
    if let Some(v) = self.get(key) {
      return Ok(v);
    }

    loop {
      if let Some(pending) = self.pending.get(key).map(|p| p.clone()) {
        pending.waiters.fetch_add(1, Ordering::SeqCst);
        let mut rx = pending.tx.subscribe();
        let result = rx.recv().await;
        pending.waiters.fetch_sub(1, Ordering::SeqCst);
        match result {
          Ok(r) => return r,
          // Sender dropped mid-send or this waiter lagged: the fetch already resolved and
          // was (or wasn't) cached; fall through and re-check the cache / retry coalescing.
          Err(_) => {
            if let Some(v) = self.get(key) {
              return Ok(v);
            }
            continue;
          }
        }
      }

      let (tx, _rx) = broadcast::channel(1);
      let entry = Arc::new(Pending { waiters: AtomicUsize::new(1), tx });
      match self.pending.entry(key.to_string()) {
        DashEntry::Occupied(_) => continue, // another task won the race; retry as a waiter
        DashEntry::Vacant(slot) => {
          slot.insert(entry.clone());
        }
      }
      self.enforce_pending_bound(key);

      let result = fetch().await;
      if let Ok(v) = &result {
        self.put(key, v.clone(), ttl);
      }
      let _ = entry.tx.send(result.clone());
      self.pending.remove(key);
      {
        let mut order = self.pending_order.lock();
        order.retain(|k| k != key);
      }
      return result;
    }
  }

  /// `MaxPending=100`: overflow evicts the oldest in-flight pending entry. Its waiters see the
  /// broadcast channel closed and fall back to re-checking the cache / re-entering the race,
  /// per spec §4.1's "coalesced waiters then proceed independently."
  fn enforce_pending_bound(&self, just_inserted: &str) {
    let mut order = self.pending_order.lock();
    order.push_back(just_inserted.to_string());
    while order.len() > MAX_PENDING {
      if let Some(oldest) = order.pop_front() {
        if oldest != just_inserted {
          self.pending.remove(&oldest);
        }
      }
    }
  }
}

impl<V: Clone + Send + Sync + 'static> Default for UrlCache<V> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::AtomicUsize as Counter;

  #[tokio::test]
  async fn resolve_once_coalesces_concurrent_fetches() {
    let cache: Arc<UrlCache<String>> = Arc::new(UrlCache::new());
    let fetch_count = Arc::new(Counter::new(0));

    let mut handles = Vec::new();
    for _ in 0..10 {
      let cache = cache.clone();
      let fetch_count = fetch_count.clone();
      handles.push(tokio::spawn(async move {
        cache
          .resolve_once("k", Duration::from_secs(60), || async move {
            fetch_count.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, String>("resolved".to_string())
          })
          .await
      }));
    }

    for h in handles {
      assert_eq!(h.await.unwrap().unwrap(), "resolved");
    }
    assert_eq!(fetch_count.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn resolve_once_returns_cached_without_refetch() {
    let cache: UrlCache<String> = UrlCache::new();
    cache.put("k", "v".to_string(), Duration::from_secs(60));
    let got = cache
      .resolve_once("k", Duration::from_secs(60), || async { Ok("other".to_string()) })
      .await
      .unwrap();
    assert_eq!(got, "v");
  }

  #[tokio::test]
  async fn resolve_once_surfaces_fetch_error_without_caching() {
    let cache: UrlCache<String> = UrlCache::new();
    let err = cache
      .resolve_once("k", Duration::from_secs(60), || async {
        Err::<String, _>("boom".to_string())
      })
      .await
      .unwrap_err();
    assert_eq!(err, "boom");
    assert!(cache.get("k").is_none());
  }

  #[test]
  fn get_expires_entries_past_ttl() {
    let cache: UrlCache<String> = UrlCache::new();
    cache.put("k", "v".to_string(), Duration::from_millis(0));
    std::thread::sleep(Duration::from_millis(5));
    assert!(cache.get("k").is_none());
  }
}
