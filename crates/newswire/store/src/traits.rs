use crate::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newswire_types::{Event, EventCategory, EventId};

/// Filter for `EventStore::query`. Results are most-recent-first.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub category: Option<EventCategory>,
    pub topic: Option<String>,
    pub min_priority: Option<f64>,
    pub since: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl EventQuery {
    pub fn latest(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn category(mut self, category: EventCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn min_priority(mut self, threshold: f64) -> Self {
        self.min_priority = Some(threshold);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }
}

/// Index counters for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub total_events: usize,
    pub categories: usize,
    pub sources: usize,
    pub priority_buckets: usize,
}

/// Storage interface for processed events.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a processed event. Storing the same id twice is a conflict.
    async fn put(&self, event: Event) -> StoreResult<()>;

    /// Get one event by id.
    async fn get(&self, id: &EventId) -> StoreResult<Option<Event>>;

    /// Query events, most-recent-first, up to `query.limit`.
    async fn query(&self, query: EventQuery) -> StoreResult<Vec<Event>>;

    /// Highest-priority events first, via the priority-bucket index.
    async fn top_priority(&self, limit: usize) -> StoreResult<Vec<Event>>;

    /// Retention sweep: remove events created before `cutoff` from the
    /// store and every index atomically with respect to readers. Returns
    /// the number of removed events.
    async fn remove_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<usize>;

    /// Index counters.
    async fn stats(&self) -> StoreResult<StoreStats>;
}
