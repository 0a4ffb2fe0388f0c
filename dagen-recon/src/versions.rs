//! Version/lock table
//!
//! One shared map from hash(batch name | provider) to the last confirmed
//! version of that key. The version lives inside its own per-key mutex, so
//! reading and advancing a version is only possible while holding that
//! key's lock; the read-decide-write sequence of the dispatcher is atomic
//! per key by construction. Slots are created atomically under the map's
//! write lock, and the table is pre-populated from the store aggregate at
//! startup, so two workers racing on an unseen key still end up on the
//! same mutex.
//!
//! Versions only ever advance. Slots are never removed.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use dagen_common::hash::batch_key_hash;

use crate::models::BatchKeyVersion;

/// A key's slot: the last confirmed version, `None` until first seen
pub type VersionSlot = Arc<Mutex<Option<u32>>>;

/// Process-wide version/lock table
pub struct VersionTable {
    slots: RwLock<HashMap<u32, VersionSlot>>,
}

impl VersionTable {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Build the table from the store's max-version aggregate. Keeps the
    /// larger version if two entries collide on the same key hash.
    pub fn from_entries(entries: impl IntoIterator<Item = BatchKeyVersion>) -> Self {
        let mut known: HashMap<u32, u32> = HashMap::new();
        for entry in entries {
            let key = batch_key_hash(&entry.batch_name, &entry.provider);
            let version = known.entry(key).or_insert(entry.version);
            if entry.version > *version {
                *version = entry.version;
            }
        }

        let slots = known
            .into_iter()
            .map(|(key, version)| (key, Arc::new(Mutex::new(Some(version)))))
            .collect();
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// Get or atomically create the slot for a key. The caller locks the
    /// returned slot for the whole read-decide-write sequence.
    pub async fn slot(&self, key: u32) -> VersionSlot {
        if let Some(slot) = self.slots.read().await.get(&key) {
            return slot.clone();
        }
        let mut slots = self.slots.write().await;
        slots
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Last confirmed version for a key, if any
    pub async fn current(&self, key: u32) -> Option<u32> {
        let slot = {
            let slots = self.slots.read().await;
            slots.get(&key)?.clone()
        };
        let version = slot.lock().await;
        *version
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }
}

impl Default for VersionTable {
    fn default() -> Self {
        Self::new()
    }
}
