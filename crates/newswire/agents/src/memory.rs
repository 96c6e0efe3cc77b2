//! Bounded agent memory
//!
//! Arena-style fixed-capacity map with TTL and explicit oldest-insertion
//! eviction. Expiry and eviction are driven by an injected clock, never a
//! background collector.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};

#[derive(Clone, Debug)]
struct MemoryEntry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Fixed-capacity key/value memory for one agent.
pub struct AgentMemory {
    capacity: usize,
    ttl: Option<Duration>,
    entries: HashMap<String, MemoryEntry>,
    /// Insertion order, oldest at the front. Re-inserting a key moves it
    /// to the back.
    order: VecDeque<String>,
}

impl AgentMemory {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Remember a value, evicting expired entries first and then the
    /// oldest insertions if the arena is full.
    pub fn remember(&mut self, key: impl Into<String>, value: impl Into<String>, now: DateTime<Utc>) {
        self.drop_expired(now);

        let key = key.into();
        if self.entries.contains_key(&key) {
            self.order.retain(|k| k != &key);
        }
        self.entries.insert(
            key.clone(),
            MemoryEntry {
                value: value.into(),
                expires_at: self.ttl.map(|ttl| now + ttl),
            },
        );
        self.order.push_back(key);

        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    pub fn recall(&mut self, key: &str, now: DateTime<Utc>) -> Option<String> {
        self.drop_expired(now);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drop_expired(&mut self, now: DateTime<Utc>) {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.expires_at.is_some_and(|at| at < now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.entries.remove(key);
        }
        if !expired.is_empty() {
            self.order.retain(|k| self.entries.contains_key(k));
        }
    }
}
