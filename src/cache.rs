//! Shared parse cache for ledger files
//!
//! The three sub-reports of an export scan the same files. The cache makes
//! sure each file is read and tokenized once:
//!
//! - entries are keyed by source location plus file name, so equally named
//!   files in different locations never alias
//! - each key owns a [`OnceCell`]; concurrent first requests wait on the same
//!   load instead of reading the file again
//! - a failed load leaves the cell empty and the next request retries
//! - the number of entries is bounded; the least recently used entry is
//!   evicted when the bound is exceeded
//!
//! Cached files are never refreshed. A restart (or eviction) is the only way
//! to pick up a file that changed under the same name.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::ledger::{self, LedgerSource, ParsedFile};
use crate::observability::Metrics;

type Slot = Arc<OnceCell<Arc<ParsedFile>>>;

struct Entry {
    slot: Slot,
    last_used: u64,
}

#[derive(Default)]
struct Slots {
    entries: HashMap<String, Entry>,
    tick: u64,
}

impl Slots {
    /// Drop least recently used entries until at most `capacity` remain.
    fn evict_over(&mut self, capacity: usize) -> u64 {
        let mut evicted = 0;
        while self.entries.len() > capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            self.entries.remove(&oldest);
            debug!(key = %oldest, "Evicted parsed ledger file");
            evicted += 1;
        }
        evicted
    }
}

pub struct ParseCache {
    slots: Mutex<Slots>,
    capacity: usize,
    metrics: Arc<Metrics>,
}

impl ParseCache {
    pub fn new(capacity: usize, metrics: Arc<Metrics>) -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            capacity: capacity.max(1),
            metrics,
        }
    }

    /// Parsed rows of `file` in `source`, loading them on first use
    pub async fn get_parsed_lines(
        &self,
        source: &dyn LedgerSource,
        file: &str,
    ) -> ledger::Result<Arc<ParsedFile>> {
        let slot = self.slot(&cache_key(source.location(), file));

        let loaded = AtomicBool::new(false);
        let parsed = slot
            .get_or_try_init(|| async {
                loaded.store(true, Ordering::Relaxed);
                let content = source.read_file(file).await?;
                let parsed = ParsedFile::parse(file, &content);
                debug!(
                    location = source.location(),
                    file,
                    rows = parsed.rows.len(),
                    "Parsed ledger file"
                );
                Ok::<_, ledger::LedgerError>(Arc::new(parsed))
            })
            .await?;

        if loaded.load(Ordering::Relaxed) {
            self.metrics.cache_miss();
        } else {
            self.metrics.cache_hit();
        }

        Ok(Arc::clone(parsed))
    }

    /// Number of cached (or loading) files
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.lock();
        slots.tick += 1;
        let tick = slots.tick;

        if let Some(entry) = slots.entries.get_mut(key) {
            entry.last_used = tick;
            return Arc::clone(&entry.slot);
        }

        let slot = Slot::default();
        slots.entries.insert(
            key.to_string(),
            Entry {
                slot: Arc::clone(&slot),
                last_used: tick,
            },
        );
        let evicted = slots.evict_over(self.capacity);
        drop(slots);

        if evicted > 0 {
            self.metrics.cache_evicted(evicted);
        }
        slot
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn cache_key(location: &str, file: &str) -> String {
    format!("{}/{}", location.trim_end_matches('/'), file)
}
