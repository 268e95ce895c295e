use crate::directory::LinkHit;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Per-chat, per-url delivery cache backing the cooldown window.
///
/// Lives for the lifetime of the process and is shared across all chats; it is
/// not persisted and resets on restart. Callers decide whether the cooldown
/// feature is on — the filter itself is unconditional.
#[derive(Debug, Default)]
pub struct RecencyFilter {
    entries: Mutex<HashMap<(i64, String), Entry>>,
    // Generation source for all marks. Each admit gets a unique generation so
    // that a stale expiry timer can recognize it lost the race.
    generation: AtomicU64,
}

#[derive(Debug)]
struct Entry {
    last_sent: Instant,
    generation: u64,
}

impl RecencyFilter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Drop candidates delivered to this chat within the cooldown window and
    /// stamp the survivors as sent *now*, before any reply goes out. A burst
    /// of near-simultaneous messages therefore admits the same url only once.
    ///
    /// Each survivor gets a deferred removal scheduled after `cooldown`; a
    /// removal scheduled before a later re-admit is a no-op (last write wins).
    pub fn filter_and_mark(
        self: &Arc<Self>,
        chat_id: i64,
        candidates: Vec<LinkHit>,
        cooldown: Duration,
    ) -> Vec<LinkHit> {
        let now = Instant::now();
        let mut survivors = Vec::with_capacity(candidates.len());

        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            for candidate in candidates {
                let key = (chat_id, candidate.url.clone());
                if let Some(entry) = entries.get(&key) {
                    if now.duration_since(entry.last_sent) < cooldown {
                        tracing::debug!(
                            chat_id,
                            url = %candidate.url,
                            "link sent recently, suppressed"
                        );
                        continue;
                    }
                }
                let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                entries.insert(
                    key,
                    Entry {
                        last_sent: now,
                        generation,
                    },
                );
                survivors.push((candidate, generation));
            }
        }

        survivors
            .into_iter()
            .map(|(candidate, generation)| {
                self.schedule_expiry(chat_id, candidate.url.clone(), generation, cooldown);
                candidate
            })
            .collect()
    }

    /// True if `(chat_id, url)` currently has a delivery record.
    pub fn is_marked(&self, chat_id: i64, url: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(&(chat_id, url.to_string()))
    }

    fn schedule_expiry(self: &Arc<Self>, chat_id: i64, url: String, generation: u64, after: Duration) {
        let filter = Arc::clone(self);
        let deadline = Instant::now() + after;
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            filter.remove_if_current(chat_id, &url, generation);
        });
    }

    /// Remove the record only if it still belongs to the delivery that
    /// scheduled this expiry. A record refreshed after the timer was set keeps
    /// its newer generation and survives.
    fn remove_if_current(&self, chat_id: i64, url: &str, generation: u64) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let key = (chat_id, url.to_string());
        if entries.get(&key).is_some_and(|e| e.generation == generation) {
            entries.remove(&key);
            tracing::debug!(chat_id, %url, "cooldown record expired");
        }
    }

    #[cfg(test)]
    fn current_generation(&self, chat_id: i64, url: &str) -> Option<u64> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(&(chat_id, url.to_string())).map(|e| e.generation)
    }
}
