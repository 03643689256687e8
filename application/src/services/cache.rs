//! Result cache
//!
//! Completed runs keyed by request [`Fingerprint`], expiring after a TTL.
//! Expiry is lazy: stale entries are dropped when looked up or by
//! [`ResultCache::purge_expired`].

use council_domain::{Fingerprint, PipelineRun};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry {
    run: PipelineRun,
    expires_at: Instant,
}

#[derive(Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<Fingerprint, CacheEntry>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<PipelineRun> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(fingerprint) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.run.clone()),
            Some(_) => {
                debug!("Cache entry {} expired", fingerprint);
                entries.remove(fingerprint);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, fingerprint: Fingerprint, run: PipelineRun, ttl: Duration) {
        let entry = CacheEntry {
            run,
            expires_at: Instant::now() + ttl,
        };
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(fingerprint, entry);
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
