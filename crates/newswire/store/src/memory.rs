//! In-memory reference implementation of `EventStore`.
//!
//! All state lives behind a single `RwLock`, so writers mutate every index
//! in one critical section and readers always observe a consistent
//! snapshot across the index set. Lock scope is one store operation; no
//! lock is held across awaits.

use crate::traits::{EventQuery, EventStore, StoreStats};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newswire_types::{Event, EventCategory, EventId, EventSource};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::RwLock;
use tracing::{debug, info};

/// Priority scores are bucketed to one decimal place for the index.
fn priority_bucket(score: f64) -> i64 {
    (score * 10.0).floor() as i64
}

#[derive(Default)]
struct Inner {
    events: HashMap<EventId, Event>,
    /// Insertion order; `created_at` is monotonic for a single-process
    /// ingester, so this doubles as the time index. Newest at the back.
    time_index: VecDeque<EventId>,
    category_index: HashMap<EventCategory, Vec<EventId>>,
    source_index: HashMap<EventSource, Vec<EventId>>,
    priority_index: BTreeMap<i64, Vec<EventId>>,
}

fn matches(event: &Event, query: &EventQuery) -> bool {
    if let Some(category) = query.category {
        if event.category != category {
            return false;
        }
    }
    if let Some(topic) = &query.topic {
        if !event.topics.contains(topic) {
            return false;
        }
    }
    if let Some(threshold) = query.min_priority {
        if event.priority_score < threshold {
            return false;
        }
    }
    if let Some(since) = query.since {
        if event.created_at < since {
            return false;
        }
    }
    true
}

/// In-memory event store adapter.
#[derive(Default)]
pub struct MemoryEventStore {
    inner: RwLock<Inner>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn put(&self, event: Event) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner.events.contains_key(&event.id) {
            return Err(StoreError::Conflict(event.id));
        }

        let id = event.id.clone();
        inner.time_index.push_back(id.clone());
        inner
            .category_index
            .entry(event.category)
            .or_default()
            .push(id.clone());
        inner
            .source_index
            .entry(event.source)
            .or_default()
            .push(id.clone());
        inner
            .priority_index
            .entry(priority_bucket(event.priority_score))
            .or_default()
            .push(id.clone());
        inner.events.insert(id.clone(), event);

        debug!(event_id = %id, total = inner.events.len(), "Event stored");
        Ok(())
    }

    async fn get(&self, id: &EventId) -> StoreResult<Option<Event>> {
        Ok(self.read()?.events.get(id).cloned())
    }

    async fn query(&self, query: EventQuery) -> StoreResult<Vec<Event>> {
        let inner = self.read()?;
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        // "Most recent K in category C" walks the category index
        // backwards: O(K), no re-sort. Other filters ride along.
        let results = if let Some(category) = query.category {
            let empty = Vec::new();
            let ids = inner.category_index.get(&category).unwrap_or(&empty);
            collect_recent(&inner, ids.iter().rev(), &query)
        } else {
            collect_recent(&inner, inner.time_index.iter().rev(), &query)
        };
        Ok(results)
    }

    async fn top_priority(&self, limit: usize) -> StoreResult<Vec<Event>> {
        let inner = self.read()?;
        let mut results = Vec::with_capacity(limit);
        // Highest bucket first; within a bucket, newest first.
        for ids in inner.priority_index.values().rev() {
            for id in ids.iter().rev() {
                if let Some(event) = inner.events.get(id) {
                    results.push(event.clone());
                    if results.len() == limit {
                        return Ok(results);
                    }
                }
            }
        }
        Ok(results)
    }

    async fn remove_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let mut inner = self.write()?;

        let mut removed = 0usize;
        // Oldest entries sit at the front of the time index.
        while let Some(oldest) = inner.time_index.front() {
            let expired = inner
                .events
                .get(oldest)
                .is_some_and(|e| e.created_at < cutoff);
            if !expired {
                break;
            }
            let Some(id) = inner.time_index.pop_front() else {
                break;
            };
            inner.events.remove(&id);
            removed += 1;
        }

        if removed > 0 {
            // Indices are filtered against the surviving event set inside
            // the same write guard, so readers never see a partial sweep.
            let mut category_index = std::mem::take(&mut inner.category_index);
            for ids in category_index.values_mut() {
                ids.retain(|id| inner.events.contains_key(id));
            }
            category_index.retain(|_, ids| !ids.is_empty());
            inner.category_index = category_index;

            let mut source_index = std::mem::take(&mut inner.source_index);
            for ids in source_index.values_mut() {
                ids.retain(|id| inner.events.contains_key(id));
            }
            source_index.retain(|_, ids| !ids.is_empty());
            inner.source_index = source_index;

            let mut priority_index = std::mem::take(&mut inner.priority_index);
            for ids in priority_index.values_mut() {
                ids.retain(|id| inner.events.contains_key(id));
            }
            priority_index.retain(|_, ids| !ids.is_empty());
            inner.priority_index = priority_index;

            info!(removed, remaining = inner.events.len(), "Retention sweep completed");
        }
        Ok(removed)
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let inner = self.read()?;
        Ok(StoreStats {
            total_events: inner.events.len(),
            categories: inner.category_index.len(),
            sources: inner.source_index.len(),
            priority_buckets: inner.priority_index.len(),
        })
    }
}

fn collect_recent<'a>(
    inner: &Inner,
    ids: impl Iterator<Item = &'a EventId>,
    query: &EventQuery,
) -> Vec<Event> {
    let mut results = Vec::with_capacity(query.limit);
    for id in ids {
        let Some(event) = inner.events.get(id) else {
            continue;
        };
        if matches(event, query) {
            results.push(event.clone());
            if results.len() == query.limit {
                break;
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::BTreeSet;

    fn event(id: &str, category: EventCategory, score: f64, created_at: DateTime<Utc>) -> Event {
        Event {
            id: EventId::new(id),
            source: EventSource::NewsApi,
            title: format!("title-{id}"),
            body: "body".into(),
            url: None,
            fingerprint: format!("fp-{id}"),
            category,
            topics: BTreeSet::from(["news".to_string()]),
            breaking: false,
            priority_score: score,
            created_at,
            enrichment: None,
        }
    }

    #[tokio::test]
    async fn put_then_get_roundtrip() {
        let store = MemoryEventStore::new();
        store
            .put(event("a", EventCategory::Tech, 1.0, Utc::now()))
            .await
            .unwrap();
        let fetched = store.get(&EventId::new("a")).await.unwrap().unwrap();
        assert_eq!(fetched.id, EventId::new("a"));
        assert!(store.get(&EventId::new("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_put_is_a_conflict() {
        let store = MemoryEventStore::new();
        let e = event("a", EventCategory::Tech, 1.0, Utc::now());
        store.put(e.clone()).await.unwrap();
        assert!(matches!(store.put(e).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn category_query_returns_k_most_recent_descending() {
        let store = MemoryEventStore::new();
        let base = Utc::now() - Duration::hours(1);
        for i in 0..6 {
            let category = if i % 2 == 0 {
                EventCategory::Tech
            } else {
                EventCategory::Sports
            };
            store
                .put(event(
                    &format!("e{i}"),
                    category,
                    1.0,
                    base + Duration::minutes(i),
                ))
                .await
                .unwrap();
        }

        let results = store
            .query(EventQuery::latest(2).category(EventCategory::Tech))
            .await
            .unwrap();
        let ids: Vec<String> = results.iter().map(|e| e.id.0.clone()).collect();
        assert_eq!(ids, vec!["e4", "e2"]);
        assert!(results[0].created_at > results[1].created_at);
    }

    #[tokio::test]
    async fn query_filters_combine() {
        let store = MemoryEventStore::new();
        let now = Utc::now();
        let mut tagged = event("tagged", EventCategory::Tech, 3.0, now);
        tagged.topics.insert("ai".into());
        store.put(tagged).await.unwrap();
        store
            .put(event("low", EventCategory::Tech, 0.5, now))
            .await
            .unwrap();

        let results = store
            .query(
                EventQuery::latest(10)
                    .category(EventCategory::Tech)
                    .topic("ai")
                    .min_priority(2.0),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, EventId::new("tagged"));
    }

    #[tokio::test]
    async fn top_priority_walks_buckets_descending() {
        let store = MemoryEventStore::new();
        let now = Utc::now();
        store.put(event("mid", EventCategory::Tech, 2.0, now)).await.unwrap();
        store.put(event("high", EventCategory::Tech, 5.5, now)).await.unwrap();
        store.put(event("low", EventCategory::Tech, 0.2, now)).await.unwrap();

        let results = store.top_priority(2).await.unwrap();
        let ids: Vec<String> = results.iter().map(|e| e.id.0.clone()).collect();
        assert_eq!(ids, vec!["high", "mid"]);
    }

    #[tokio::test]
    async fn retention_sweep_updates_every_index() {
        let store = MemoryEventStore::new();
        let now = Utc::now();
        store
            .put(event("old", EventCategory::Sports, 1.0, now - Duration::hours(48)))
            .await
            .unwrap();
        store
            .put(event("fresh", EventCategory::Tech, 2.0, now))
            .await
            .unwrap();

        let removed = store.remove_older_than(now - Duration::hours(24)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&EventId::new("old")).await.unwrap().is_none());

        let stats = store.stats().await.unwrap();
        assert_eq!(
            stats,
            StoreStats {
                total_events: 1,
                categories: 1,
                sources: 1,
                priority_buckets: 1,
            }
        );
        // The swept category no longer answers queries.
        assert!(store
            .query(EventQuery::latest(10).category(EventCategory::Sports))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn concurrent_puts_and_queries_stay_consistent() {
        let store = std::sync::Arc::new(MemoryEventStore::new());
        let now = Utc::now();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    store
                        .put(event(&format!("w{i}"), EventCategory::Tech, 1.0, now))
                        .await
                        .unwrap();
                }
            })
        };
        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    let results = store
                        .query(EventQuery::latest(10).category(EventCategory::Tech))
                        .await
                        .unwrap();
                    // Every returned id must resolve: no torn reads.
                    for e in results {
                        assert!(store.get(&e.id).await.unwrap().is_some());
                    }
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
        assert_eq!(store.stats().await.unwrap().total_events, 50);
    }
}
