//! Surrogate-key allocation and short-lived content-hash caching.
//!
//! ColumnStore tables have no auto-increment and no primary key support, so
//! every dimension row's integer key has to be minted here instead of by the
//! database. A per-table monotonic counter hands out ids; a time-bounded
//! cache keyed by a content hash lets a burst of records that repeat the same
//! dimension value (e.g. the same browser name) reuse one id without a round
//! trip to the database for every record.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::trace;

use crate::sanitize::render_literal;
use crate::schema::{Run, Schema, Table};

/// Build the raw content key for a dimension subtree: every leaf value, in
/// schema order, joined by `#`, recursing into nested foreign keys by the
/// same rule rather than substituting a resolved id. Two records whose
/// subtrees produce the same raw key describe the same dimension row,
/// regardless of what surrogate id either ends up with.
pub fn content_key(nodes: &[Schema], run: &Run) -> String {
    let mut parts = Vec::new();
    collect_leaves(nodes, run, &mut parts);
    parts.join("#")
}

fn collect_leaves(nodes: &[Schema], run: &Run, parts: &mut Vec<String>) {
    for node in nodes {
        match node {
            Schema::Int { field, .. } | Schema::Text { field, .. } => {
                parts.push(render_literal(field.value(run).as_ref()));
            }
            Schema::ForeignKey { schema, .. } => collect_leaves(schema, run, parts),
        }
    }
}

/// Hash a raw content key into a fixed-length string suitable as a cache key
/// and as the value compared during lookup deduplication.
pub fn hash_content_key(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// How long a resolved dimension key stays in the cache before it is
/// evicted and must be re-looked-up or re-inserted.
pub const CACHE_TTL: Duration = Duration::from_secs(100);

struct CacheEntry {
    id: u64,
    generation: u64,
}

/// Allocates and caches surrogate keys for every dimension table.
///
/// Cheap to clone: the counters and cache live behind `Arc`, so a clone
/// shares state with the original rather than copying it.
#[derive(Clone)]
pub struct KeyBank {
    counters: Arc<HashMap<Table, AtomicU64>>,
    cache: Arc<RwLock<HashMap<(Table, String), CacheEntry>>>,
    generation: Arc<AtomicU64>,
}

impl KeyBank {
    /// Build a bank seeded with each dimension's next available id —
    /// typically `1 + MAX(id)` read from the live table at startup, or `1`
    /// for a freshly created warehouse.
    pub fn new(seeds: HashMap<Table, u64>) -> Self {
        let counters = Table::all()
            .iter()
            .map(|table| {
                let seed = seeds.get(table).copied().unwrap_or(1);
                (*table, AtomicU64::new(seed))
            })
            .collect();
        Self {
            counters: Arc::new(counters),
            cache: Arc::new(RwLock::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Mint the next unused id for `table`, without touching the cache.
    pub fn next_id(&self, table: Table) -> u64 {
        self.counters
            .get(&table)
            .expect("every Table has a counter")
            .fetch_add(1, Ordering::SeqCst)
    }

    /// Resolve `content_key` for `table`. Returns `(id, true)` on a cache
    /// hit — the caller can skip lookup/insert entirely — or allocates a
    /// fresh id, caches it, and returns `(id, false)` on a miss.
    ///
    /// The check and the allocate-then-cache sequence run under a single
    /// write-lock acquisition: two concurrent misses on the same content key
    /// must not each believe they minted the id, which a separate
    /// read-then-write pair would allow.
    pub async fn request_key(&self, table: Table, content_key: &str) -> (u64, bool) {
        let mut guard = self.cache.write().await;
        if let Some(entry) = guard.get(&(table, content_key.to_string())) {
            trace!(table = table.name(), content_key, id = entry.id, "key bank cache hit");
            return (entry.id, true);
        }
        let id = self.next_id(table);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        guard.insert((table, content_key.to_string()), CacheEntry { id, generation });
        self.schedule_eviction(table, content_key, generation);
        trace!(table = table.name(), content_key, id, "key bank allocated fresh id");
        (id, false)
    }

    /// Record a known `(table, content_key) -> id` mapping directly, e.g.
    /// after a lookup statement resolved an existing row. Future
    /// `request_key` calls for the same content then hit the cache.
    pub async fn set(&self, table: Table, content_key: &str, id: u64) {
        let mut guard = self.cache.write().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        guard.insert((table, content_key.to_string()), CacheEntry { id, generation });
        self.schedule_eviction(table, content_key, generation);
    }

    /// Spawn the task that evicts this entry after [`CACHE_TTL`], unless a
    /// newer entry for the same key has since replaced it. Does not itself
    /// touch the cache lock — the caller is expected to still be holding it.
    fn schedule_eviction(&self, table: Table, content_key: &str, generation: u64) {
        let cache = Arc::clone(&self.cache);
        let key = (table, content_key.to_string());
        tokio::spawn(async move {
            tokio::time::sleep(CACHE_TTL).await;
            let mut guard = cache.write().await;
            if let Some(entry) = guard.get(&key) {
                if entry.generation == generation {
                    guard.remove(&key);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", start_paused = true)]
    async fn miss_then_hit_returns_same_id() {
        let bank = KeyBank::new(HashMap::new());
        let (id1, hit1) = bank.request_key(Table::Browser, "Chrome#120").await;
        assert!(!hit1);
        let (id2, hit2) = bank.request_key(Table::Browser, "Chrome#120").await;
        assert!(hit2);
        assert_eq!(id1, id2);
    }

    #[tokio::test(flavor = "multi_thread", start_paused = true)]
    async fn distinct_content_keys_get_distinct_ids() {
        let bank = KeyBank::new(HashMap::new());
        let (id1, _) = bank.request_key(Table::Browser, "Chrome#120").await;
        let (id2, _) = bank.request_key(Table::Browser, "Firefox#115").await;
        assert_ne!(id1, id2);
    }

    #[tokio::test(flavor = "multi_thread", start_paused = true)]
    async fn entry_is_evicted_after_ttl() {
        let bank = KeyBank::new(HashMap::new());
        let (id1, _) = bank.request_key(Table::Browser, "Chrome#120").await;
        tokio::time::advance(CACHE_TTL + Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        let (id2, hit2) = bank.request_key(Table::Browser, "Chrome#120").await;
        assert!(!hit2);
        assert_ne!(id1, id2);
    }

    #[test]
    fn content_key_is_stable_for_identical_input() {
        use crate::schema::{fact_schema, Run};
        let run = Run {
            score: 1,
            status_code: 200,
            error_message: None,
            plugin_version: "1.0".into(),
            plugin_name: "DBTest".into(),
            extension_version: "0.0.1".into(),
            browser_version: "120".into(),
            browser_name: "Chrome".into(),
            path: "/".into(),
            url: "https://example.com".into(),
        };
        let nodes = fact_schema();
        let a = content_key(&nodes, &run);
        let b = content_key(&nodes, &run);
        assert_eq!(a, b);
        assert_eq!(hash_content_key(&a), hash_content_key(&b));
    }

    #[tokio::test]
    async fn seeds_are_honored() {
        let mut seeds = HashMap::new();
        seeds.insert(Table::Plugin, 50);
        let bank = KeyBank::new(seeds);
        assert_eq!(bank.next_id(Table::Plugin), 50);
        assert_eq!(bank.next_id(Table::Plugin), 51);
        assert_eq!(bank.next_id(Table::Browser), 1);
    }
}
