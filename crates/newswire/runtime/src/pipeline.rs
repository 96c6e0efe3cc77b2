//! Pipeline orchestration
//!
//! Wires the stages together and owns the outer boundaries. Per-event
//! order is fixed: normalize, classify, score, route, enrich, store,
//! publish. An event is routable only once classified and scored, and
//! notifiable only once the store write succeeded.

use crate::error::{PipelineError, PipelineResult};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use newswire_consensus::DecisionEngine;
use newswire_notify::{DeliveryFailure, EventSink, Notifier};
use newswire_pipeline::{normalize, Classifier, Enricher, HeuristicAnalyzer, LanguageAnalyzer, Prioritizer};
use newswire_routing::SubscriptionRegistry;
use newswire_store::{EventQuery, EventStore, MemoryEventStore, StoreStats};
use newswire_types::{
    DestinationId, Event, EventId, PipelineConfig, RawEvent, Subscription, SubscriptionId,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Outcome of a batch ingest. Failed entries keep their position in the
/// input so the caller can retry or discard specific payloads.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: Vec<(usize, String)>,
}

/// Counts from one maintenance tick.
#[derive(Debug, Default)]
pub struct MaintenanceReport {
    pub events_removed: usize,
    pub proposals_closed: usize,
}

pub struct NewswirePipeline {
    config: PipelineConfig,
    classifier: Classifier,
    prioritizer: Prioritizer,
    enricher: Enricher,
    registry: SubscriptionRegistry,
    store: Arc<dyn EventStore>,
    notifier: Notifier,
    engine: Arc<DecisionEngine>,
    shutdown: watch::Sender<bool>,
}

impl NewswirePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(MemoryEventStore::new()),
            HeuristicAnalyzer,
        )
    }

    /// Assemble a pipeline over a custom store and analyzer. Used by tests
    /// and by deployments with a durable backend.
    pub fn with_parts(
        config: PipelineConfig,
        store: Arc<dyn EventStore>,
        analyzer: impl LanguageAnalyzer + 'static,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            classifier: Classifier::default(),
            prioritizer: Prioritizer::new(config.priority.clone()),
            enricher: Enricher::new(analyzer),
            registry: SubscriptionRegistry::new(),
            notifier: Notifier::new(config.retry.clone()),
            engine: Arc::new(DecisionEngine::new()),
            store,
            config,
            shutdown,
        }
    }

    /// Ingestion boundary. Runs the full per-event stage chain; storage
    /// failure is fatal for the event and surfaced, enrichment failure is
    /// not. Returns the id of the stored event.
    pub async fn ingest(&self, raw: &RawEvent) -> PipelineResult<EventId> {
        if *self.shutdown.borrow() {
            return Err(PipelineError::ShuttingDown);
        }

        let event = normalize(raw)?;
        let mut event = self.classifier.classify(event);
        event.priority_score = self.prioritizer.score(&event, Utc::now());
        let destinations = self.registry.route(&event);

        // Enrichment degrades: the event continues un-enriched. The
        // enricher already logs the failure.
        let _ = self.enricher.enrich(&mut event).await;

        self.store.put(event.clone()).await?;
        let queued = self.notifier.publish(&event, &destinations);
        debug!(
            event_id = %event.id,
            category = %event.category,
            score = event.priority_score,
            destinations = queued,
            "Event ingested"
        );
        Ok(event.id)
    }

    /// Batch ingestion with bounded concurrency. Each payload runs its
    /// whole stage chain inside one task so no event is half-written; the
    /// shutdown flag is honored between payloads.
    pub async fn ingest_batch(&self, raws: &[RawEvent]) -> BatchReport {
        let results: Vec<(usize, PipelineResult<EventId>)> = stream::iter(raws.iter().enumerate())
            .map(|(index, raw)| async move { (index, self.ingest(raw).await) })
            .buffer_unordered(self.config.stage_concurrency.max(1))
            .collect()
            .await;

        let mut report = BatchReport::default();
        for (index, result) in results {
            match result {
                Ok(_) => report.succeeded += 1,
                Err(error) => report.failed.push((index, error.to_string())),
            }
        }
        report.failed.sort_by_key(|(index, _)| *index);
        if !report.failed.is_empty() {
            warn!(
                succeeded = report.succeeded,
                failed = report.failed.len(),
                "Batch ingest completed with failures"
            );
        }
        report
    }

    // Subscription boundary.

    pub fn subscribe(&self, subscription: Subscription) -> SubscriptionId {
        self.registry.register(subscription)
    }

    pub fn unsubscribe(&self, id: &SubscriptionId, owner: &str) -> PipelineResult<()> {
        self.registry.remove(id, owner)?;
        Ok(())
    }

    pub fn register_sink(&self, destination: DestinationId, sink: Arc<dyn EventSink>) {
        self.notifier.register(destination, sink);
    }

    // Query boundary.

    pub async fn query(&self, query: EventQuery) -> PipelineResult<Vec<Event>> {
        Ok(self.store.query(query).await?)
    }

    pub async fn event(&self, id: &EventId) -> PipelineResult<Option<Event>> {
        Ok(self.store.get(id).await?)
    }

    pub async fn top_priority(&self, limit: usize) -> PipelineResult<Vec<Event>> {
        Ok(self.store.top_priority(limit).await?)
    }

    pub async fn stats(&self) -> PipelineResult<StoreStats> {
        Ok(self.store.stats().await?)
    }

    // Voting boundary. Proposal lifecycle calls go straight to the engine.

    pub fn decisions(&self) -> &Arc<DecisionEngine> {
        &self.engine
    }

    pub fn delivery_failures(&self) -> Vec<DeliveryFailure> {
        self.notifier.failures()
    }

    /// Retention sweep plus proposal deadline sweep. Meant to run on a
    /// timer from the hosting binary.
    pub async fn maintenance(&self, now: DateTime<Utc>) -> PipelineResult<MaintenanceReport> {
        let cutoff = now - self.config.retention_horizon();
        let events_removed = self.store.remove_older_than(cutoff).await?;
        let proposals_closed = self.engine.sweep_deadlines(now).len();
        if events_removed > 0 || proposals_closed > 0 {
            info!(events_removed, proposals_closed, "Maintenance tick");
        }
        Ok(MaintenanceReport {
            events_removed,
            proposals_closed,
        })
    }

    /// Stop accepting new payloads and tear down delivery workers.
    /// Already-queued deliveries are dropped, matching at-least-once on
    /// the publish side only.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        self.notifier.shutdown();
    }
}
