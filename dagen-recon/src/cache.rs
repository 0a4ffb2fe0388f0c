//! Enrichment cache
//!
//! A fixed-capacity least-recently-used cache in front of the reference
//! transaction table. One instance is shared by all dispatcher workers for
//! the life of the process.
//!
//! The LRU itself is a slot arena threaded into a doubly linked recency
//! list, with a key index pointing at slot positions, so both `get` and
//! `put` are O(1).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;

use dagen_common::Result;

use crate::models::{TransactionRecord, TxAttributes};

struct Slot<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Fixed-capacity LRU cache. Not synchronized; callers wrap it in a lock.
pub struct LruCache<K, V> {
    capacity: usize,
    slots: Vec<Slot<K, V>>,
    index: HashMap<K, usize>,
    /// Least recently used end of the recency list
    head: Option<usize>,
    /// Most recently used end
    tail: Option<usize>,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Look up a key and promote it to most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let i = *self.index.get(key)?;
        self.detach(i);
        self.push_back(i);
        Some(&self.slots[i].value)
    }

    /// Insert or update a value, evicting the least recently used entry
    /// when the capacity would be exceeded.
    pub fn put(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }

        if let Some(&i) = self.index.get(&key) {
            self.slots[i].value = value;
            self.detach(i);
            self.push_back(i);
            return;
        }

        if self.slots.len() < self.capacity {
            let i = self.slots.len();
            self.slots.push(Slot {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.index.insert(key, i);
            self.push_back(i);
            return;
        }

        // Full: evict the LRU entry and reuse its slot.
        if let Some(i) = self.head {
            self.detach(i);
            self.index.remove(&self.slots[i].key);
            self.slots[i].key = key.clone();
            self.slots[i].value = value;
            self.index.insert(key, i);
            self.push_back(i);
        }
    }

    fn detach(&mut self, i: usize) {
        let (prev, next) = (self.slots[i].prev, self.slots[i].next);
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[i].prev = None;
        self.slots[i].next = None;
    }

    fn push_back(&mut self, i: usize) {
        self.slots[i].prev = self.tail;
        self.slots[i].next = None;
        match self.tail {
            Some(t) => self.slots[t].next = Some(i),
            None => self.head = Some(i),
        }
        self.tail = Some(i);
    }
}

type TxKey = (String, String);

/// Shared, internally synchronized LRU over enrichment attributes,
/// keyed by (merchant reference number, activity type).
pub struct EnrichmentCache {
    inner: Mutex<LruCache<TxKey, TxAttributes>>,
}

impl EnrichmentCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn get(&self, mrn: &str, activity_type: &str) -> Option<TxAttributes> {
        let key = (mrn.to_string(), activity_type.to_string());
        self.inner.lock().await.get(&key).cloned()
    }

    pub async fn put(&self, mrn: &str, activity_type: &str, attrs: TxAttributes) {
        let key = (mrn.to_string(), activity_type.to_string());
        self.inner.lock().await.put(key, attrs);
    }
}

/// Everything submission enrichment needs: the shared cache and the data
/// store holding the reference transactions.
#[derive(Clone)]
pub struct EnrichmentContext {
    cache: Arc<EnrichmentCache>,
    data_db: SqlitePool,
}

impl EnrichmentContext {
    pub fn new(cache: Arc<EnrichmentCache>, data_db: SqlitePool) -> Self {
        Self { cache, data_db }
    }

    /// Resolve enrichment attributes for a key: cache first, then the
    /// transaction table. A store hit is cached; a miss is not, because new
    /// reference transactions arrive every round and must become visible.
    pub async fn lookup(&self, mrn: &str, activity_type: &str) -> Result<Option<TxAttributes>> {
        if let Some(attrs) = self.cache.get(mrn, activity_type).await {
            return Ok(Some(attrs));
        }

        match TransactionRecord::find_by_key(&self.data_db, mrn, activity_type).await? {
            Some(tx) => {
                let attrs = tx.attributes();
                self.cache.put(mrn, activity_type, attrs.clone()).await;
                Ok(Some(attrs))
            }
            None => Ok(None),
        }
    }
}
