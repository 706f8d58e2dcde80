//! LRU(L=512) + TTL(T=10min) result cache keyed by (query, source-set),
//! case-folded and whitespace-normalized (spec.md §4.3).

use std::time::{Duration, Instant};

use debate_core::{RagHit, RagSourceKind};
use lru::LruCache;
use parking_lot::Mutex;

pub const DEFAULT_CAPACITY: usize = 512;
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

fn normalize_key(query: &str, sources: &[RagSourceKind]) -> String {
    let mut kinds: Vec<&'static str> = sources
        .iter()
        .map(|k| match k {
            RagSourceKind::Web => "web",
            RagSourceKind::Vector => "vector",
            RagSourceKind::Philosopher => "philosopher",
        })
        .collect();
    kinds.sort_unstable();
    let normalized_query = query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    format!("{normalized_query}|{}", kinds.join(","))
}

struct Entry {
    hits: Vec<RagHit>,
    inserted_at: Instant,
}

pub struct RagCache {
    ttl: Duration,
    inner: Mutex<LruCache<String, Entry>>,
}

impl RagCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(LruCache::new(
                std::num::NonZeroUsize::new(capacity.max(1)).unwrap(),
            )),
        }
    }

    pub fn get(&self, query: &str, sources: &[RagSourceKind]) -> Option<Vec<RagHit>> {
        let key = normalize_key(query, sources);
        let mut guard = self.inner.lock();
        if let Some(entry) = guard.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.hits.clone());
            }
            guard.pop(&key);
        }
        None
    }

    pub fn put(&self, query: &str, sources: &[RagSourceKind], hits: Vec<RagHit>) {
        let key = normalize_key(query, sources);
        self.inner.lock().put(key, Entry { hits, inserted_at: Instant::now() });
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RagCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(kind: RagSourceKind, id: &str) -> RagHit {
        RagHit { source_kind: kind, source_id: id.into(), title: id.into(), snippet: "s".into(), score: 0.5 }
    }

    #[test]
    fn keys_are_case_and_whitespace_normalized() {
        let cache = RagCache::default();
        cache.put("  Is Free Will   Real", &[RagSourceKind::Web], vec![hit(RagSourceKind::Web, "a")]);
        assert!(cache.get("is free will real", &[RagSourceKind::Web]).is_some());
    }

    #[test]
    fn expired_entries_are_evicted_on_read() {
        let cache = RagCache::new(512, Duration::from_millis(1));
        cache.put("q", &[RagSourceKind::Web], vec![hit(RagSourceKind::Web, "a")]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("q", &[RagSourceKind::Web]).is_none());
    }

    #[test]
    fn distinct_source_sets_are_distinct_keys() {
        let cache = RagCache::default();
        cache.put("q", &[RagSourceKind::Web], vec![hit(RagSourceKind::Web, "a")]);
        assert!(cache.get("q", &[RagSourceKind::Vector]).is_none());
    }
}
