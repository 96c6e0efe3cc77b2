//! Notification fan-out
//!
//! Fans stored events out to subscribed destinations. Every destination
//! gets its own queue and worker, so a slow or failing sink degrades only
//! its own latency. Delivery is at-least-once with bounded retry; after
//! exhaustion the failure is recorded, never silently dropped.

#![deny(unsafe_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newswire_types::{DestinationId, Event, EventId, RetryPolicy};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Delivery errors surfaced by sinks and the notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("destination not registered: {0}")]
    UnknownDestination(DestinationId),
}

/// A consumer-implemented delivery capability. Destinations must tolerate
/// duplicate delivery; the notifier does not deduplicate.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, event: &Event) -> NotifyResult<()>;
}

/// Record of a delivery that exhausted its retries.
#[derive(Clone, Debug)]
pub struct DeliveryFailure {
    pub destination: DestinationId,
    pub event_id: EventId,
    pub attempts: u32,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

struct Channel {
    sender: mpsc::UnboundedSender<Event>,
    worker: JoinHandle<()>,
}

/// Per-destination queued delivery with retry.
pub struct Notifier {
    retry: RetryPolicy,
    channels: RwLock<HashMap<DestinationId, Channel>>,
    failures: Arc<Mutex<Vec<DeliveryFailure>>>,
}

impl Notifier {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            retry,
            channels: RwLock::new(HashMap::new()),
            failures: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a destination, spawning its delivery worker. Re-registering
    /// a destination replaces its sink; queued events for the old sink are
    /// dropped with the old worker.
    pub fn register(&self, destination: DestinationId, sink: Arc<dyn EventSink>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(delivery_worker(
            destination.clone(),
            sink,
            receiver,
            self.retry,
            Arc::clone(&self.failures),
        ));

        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = channels.insert(destination.clone(), Channel { sender, worker }) {
            old.worker.abort();
        }
        info!(destination = %destination, "Notification destination registered");
    }

    /// Enqueue an event for each destination. Returns how many queues
    /// accepted it; unknown destinations are recorded as failures.
    pub fn publish(&self, event: &Event, destinations: &[DestinationId]) -> usize {
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        let mut enqueued = 0;
        for destination in destinations {
            match channels.get(destination) {
                Some(channel) if channel.sender.send(event.clone()).is_ok() => {
                    enqueued += 1;
                }
                _ => {
                    warn!(
                        destination = %destination,
                        event_id = %event.id,
                        "No live queue for destination"
                    );
                    self.record_failure(DeliveryFailure {
                        destination: destination.clone(),
                        event_id: event.id.clone(),
                        attempts: 0,
                        reason: "destination not registered".to_string(),
                        failed_at: Utc::now(),
                    });
                }
            }
        }
        debug!(event_id = %event.id, enqueued, "Event published");
        enqueued
    }

    /// Exhausted deliveries recorded so far.
    pub fn failures(&self) -> Vec<DeliveryFailure> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Drop all queues and stop the workers. Pending deliveries are
    /// abandoned; callers drain before shutdown if they care.
    pub fn shutdown(&self) {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        for (_, channel) in channels.drain() {
            channel.worker.abort();
        }
    }

    fn record_failure(&self, failure: DeliveryFailure) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(failure);
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn delivery_worker(
    destination: DestinationId,
    sink: Arc<dyn EventSink>,
    mut receiver: mpsc::UnboundedReceiver<Event>,
    retry: RetryPolicy,
    failures: Arc<Mutex<Vec<DeliveryFailure>>>,
) {
    while let Some(event) = receiver.recv().await {
        let mut last_error = String::new();
        let mut delivered = false;

        for attempt in 1..=retry.max_attempts.max(1) {
            match sink.deliver(&event).await {
                Ok(()) => {
                    debug!(
                        destination = %destination,
                        event_id = %event.id,
                        attempt,
                        "Event delivered"
                    );
                    delivered = true;
                    break;
                }
                Err(err) => {
                    last_error = err.to_string();
                    if attempt < retry.max_attempts {
                        let backoff = Duration::from_millis(retry.backoff_ms(attempt));
                        debug!(
                            destination = %destination,
                            event_id = %event.id,
                            attempt,
                            backoff_ms = backoff.as_millis() as u64,
                            "Delivery failed, backing off"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        if !delivered {
            warn!(
                destination = %destination,
                event_id = %event.id,
                attempts = retry.max_attempts,
                error = %last_error,
                "Delivery retries exhausted"
            );
            failures.lock().unwrap_or_else(|e| e.into_inner()).push(DeliveryFailure {
                destination: destination.clone(),
                event_id: event.id.clone(),
                attempts: retry.max_attempts,
                reason: last_error,
                failed_at: Utc::now(),
            });
        }
    }
}
