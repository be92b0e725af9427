use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};

/// Idle time after which a memoized model becomes eligible for eviction.
pub const MODEL_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMemoEntry {
    pub model: String,
    pub last_used: Instant,
}

/// Process-wide memo of the model each organization last worked with.
///
/// Shared by every client; all access goes through the internal lock.
#[derive(Debug, Default)]
pub struct ModelCache {
    entries: Mutex<HashMap<String, ModelMemoEntry>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache shared by clients that were not given one explicitly.
    pub fn global() -> Arc<ModelCache> {
        static GLOBAL: OnceLock<Arc<ModelCache>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ModelCache::new())))
    }

    pub fn get(&self, organization_id: &str) -> Option<String> {
        lock_unpoisoned(&self.entries)
            .get(organization_id)
            .map(|entry| entry.model.clone())
    }

    pub fn entry(&self, organization_id: &str) -> Option<ModelMemoEntry> {
        lock_unpoisoned(&self.entries).get(organization_id).cloned()
    }

    /// Record `model` as used now, replacing any prior entry.
    pub fn put(&self, organization_id: &str, model: &str) {
        self.put_at(organization_id, model, Instant::now());
    }

    pub fn put_at(&self, organization_id: &str, model: &str, last_used: Instant) {
        lock_unpoisoned(&self.entries).insert(
            organization_id.to_owned(),
            ModelMemoEntry {
                model: model.to_owned(),
                last_used,
            },
        );
    }

    pub fn remove(&self, organization_id: &str) -> Option<ModelMemoEntry> {
        lock_unpoisoned(&self.entries).remove(organization_id)
    }

    /// Drop every entry whose `last_used + MODEL_TTL` lies before `now`.
    ///
    /// Returns the number of evicted entries.
    pub fn evict_stale(&self, now: Instant) -> usize {
        let mut entries = lock_unpoisoned(&self.entries);
        let before = entries.len();
        entries.retain(|_, entry| entry.last_used + MODEL_TTL >= now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
