//! Time-bounded map from relayed message id to its origin channel.
//!
//! Each entry is removed by a one-shot timer after the table's TTL. Lookups
//! also check the deadline, so an entry is never observable at or past its
//! expiry even if the timer has not run yet.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, Weak},
    time::Duration,
};

use {tokio::time::Instant, tracing::trace};

use crate::types::RelayEntry;

struct Slot {
    entry: RelayEntry,
    expires_at: Instant,
    /// Distinguishes re-insertions of the same id so a stale timer
    /// cannot remove a newer entry.
    generation: u64,
}

#[derive(Default)]
struct Slots {
    by_id: HashMap<String, Slot>,
    next_generation: u64,
}

/// Correlation store for two-way relay.
pub struct RelayTable {
    slots: Arc<Mutex<Slots>>,
    ttl: Duration,
}

impl RelayTable {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots::default())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Record that replies to `message_id` go back to `entry`, for the table's TTL.
    pub fn put(&self, message_id: impl Into<String>, entry: RelayEntry) {
        self.put_with_ttl(message_id, entry, self.ttl);
    }

    pub fn put_with_ttl(&self, message_id: impl Into<String>, entry: RelayEntry, ttl: Duration) {
        let message_id = message_id.into();
        let expires_at = Instant::now() + ttl;
        let generation = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            let generation = slots.next_generation;
            slots.next_generation += 1;
            slots.by_id.insert(message_id.clone(), Slot {
                entry,
                expires_at,
                generation,
            });
            generation
        };

        // Outside a runtime the deadline check in `get` still enforces expiry;
        // the entry is reclaimed by `purge_expired`.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let slots = Arc::downgrade(&self.slots);
            handle.spawn(expire_at(slots, message_id, generation, expires_at));
        }
    }

    /// Origin for a relayed message id, if it is still within its reply window.
    pub fn get(&self, message_id: &str) -> Option<RelayEntry> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .by_id
            .get(message_id)
            .filter(|slot| Instant::now() < slot.expires_at)
            .map(|slot| slot.entry.clone())
    }

    /// Drop every entry past its deadline. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let before = slots.by_id.len();
        slots.by_id.retain(|_, slot| now < slot.expires_at);
        before - slots.by_id.len()
    }

    /// Number of entries still within their reply window.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots
            .by_id
            .values()
            .filter(|slot| now < slot.expires_at)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn expire_at(slots: Weak<Mutex<Slots>>, message_id: String, generation: u64, at: Instant) {
    tokio::time::sleep_until(at).await;
    let Some(slots) = slots.upgrade() else {
        return;
    };
    let mut slots = slots.lock().unwrap_or_else(|e| e.into_inner());
    if slots
        .by_id
        .get(&message_id)
        .is_some_and(|slot| slot.generation == generation)
    {
        slots.by_id.remove(&message_id);
        trace!(message_id, "relay entry expired");
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn origin(channel_id: &str) -> RelayEntry {
        RelayEntry {
            platform: "onebot".into(),
            channel_id: channel_id.into(),
            self_id: "A1".into(),
            guild_id: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn entry_lives_exactly_ttl() {
        let table = RelayTable::new(Duration::from_millis(1000));
        table.put("M", origin("100"));

        tokio::time::advance(Duration::from_millis(999)).await;
        assert_eq!(table.get("M"), Some(origin("100")));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(table.get("M"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_removes_entry() {
        let table = RelayTable::new(Duration::from_secs(60));
        table.put("M", origin("100"));
        assert_eq!(table.len(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(table.is_empty());
        assert_eq!(table.purge_expired(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_keeps_newer_entry() {
        let table = RelayTable::new(Duration::from_secs(10));
        table.put("M", origin("old"));
        tokio::time::advance(Duration::from_secs(5)).await;
        table.put("M", origin("new"));

        // The first timer fires here but must not remove the re-inserted id.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(table.get("M"), Some(origin("new")));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(table.get("M"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn per_entry_ttl_override() {
        let table = RelayTable::new(Duration::from_secs(3600));
        table.put_with_ttl("short", origin("1"), Duration::from_millis(10));
        table.put("long", origin("2"));

        tokio::time::advance(Duration::from_millis(10)).await;
        assert_eq!(table.get("short"), None);
        assert!(table.get("long").is_some());
    }

    #[test]
    fn works_without_runtime() {
        let table = RelayTable::new(Duration::ZERO);
        table.put("M", origin("100"));
        assert_eq!(table.get("M"), None);
        assert_eq!(table.purge_expired(), 1);
        assert_eq!(table.get("unknown"), None);
    }
}
