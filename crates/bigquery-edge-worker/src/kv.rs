//! Key-value storage with per-entry expiry, used to share a token between requests.
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Longer TTLs are clamped to this, so the deadline can't overflow.
const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365);

pub trait KvStore: fmt::Debug + Send + Sync + 'static {
    /// Returns the value stored under `key`, unless it's missing or expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value. It stops being returned
    /// by [`KvStore::get`] once `ttl` has elapsed.
    fn put(&self, key: &str, value: String, ttl: Duration);
}

/// A process-local [`KvStore`].
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<Box<str>, Entry>>,
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for MemoryKv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // values are tokens, only show the keys
        let entries = self.entries.lock();
        f.debug_set().entries(entries.keys()).finish()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;

        if Instant::now() < entry.expires_at {
            return Some(entry.value.clone());
        }

        entries.remove(key);
        None
    }

    fn put(&self, key: &str, value: String, ttl: Duration) {
        let expires_at = Instant::now() + ttl.min(MAX_TTL);

        self.entries
            .lock()
            .insert(Box::from(key), Entry { value, expires_at });
    }
}
