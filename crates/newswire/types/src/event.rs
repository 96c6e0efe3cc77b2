//! The canonical event shape
//!
//! A `RawEvent` is whatever a source hands us. The pipeline turns it into
//! an `Event`, which is immutable once stored except for the write-once
//! `enrichment` field.

use crate::EventId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where an event came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    RssFeed,
    Api,
    Webhook,
    SocialMedia,
    NewsApi,
    UserSubmission,
    Internal,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::RssFeed => "rss_feed",
            EventSource::Api => "api",
            EventSource::Webhook => "webhook",
            EventSource::SocialMedia => "social_media",
            EventSource::NewsApi => "news_api",
            EventSource::UserSubmission => "user_submission",
            EventSource::Internal => "internal",
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed category set assigned by the classifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Breaking,
    Politics,
    Economy,
    Tech,
    Science,
    Sports,
    Entertainment,
    Health,
    Environment,
    International,
    Other,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Breaking => "breaking",
            EventCategory::Politics => "politics",
            EventCategory::Economy => "economy",
            EventCategory::Tech => "tech",
            EventCategory::Science => "science",
            EventCategory::Sports => "sports",
            EventCategory::Entertainment => "entertainment",
            EventCategory::Health => "health",
            EventCategory::Environment => "environment",
            EventCategory::International => "international",
            EventCategory::Other => "other",
        }
    }

    /// All categories, in classifier priority order
    pub fn all() -> &'static [EventCategory] {
        &[
            EventCategory::Breaking,
            EventCategory::Politics,
            EventCategory::Economy,
            EventCategory::Tech,
            EventCategory::Science,
            EventCategory::Sports,
            EventCategory::Entertainment,
            EventCategory::Health,
            EventCategory::Environment,
            EventCategory::International,
            EventCategory::Other,
        ]
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw payload as received from a source, before normalization
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawEvent {
    pub source: EventSource,
    /// Opaque source payload; the normalizer knows which fields it needs
    pub payload: serde_json::Value,
    /// When the payload was received. Injected by the caller so the
    /// pipeline stays deterministic under test.
    pub received_at: DateTime<Utc>,
    /// Source explicitly marked this payload as urgent
    #[serde(default)]
    pub urgent: bool,
}

impl RawEvent {
    pub fn new(source: EventSource, payload: serde_json::Value, received_at: DateTime<Utc>) -> Self {
        Self {
            source,
            payload,
            received_at,
            urgent: false,
        }
    }

    pub fn urgent(mut self) -> Self {
        self.urgent = true;
        self
    }
}

/// Language-analysis output attached to an event. Write-once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Sentiment in [-1, 1]
    pub sentiment: f64,
    /// Extracted named entities, in order of appearance
    pub entities: Vec<String>,
    pub summary: String,
    pub keywords: Vec<String>,
}

/// A normalized unit of news/information flowing through the pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub source: EventSource,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Content/source fingerprint for duplicate suppression. Stable across
    /// repeated ingestion of the same payload.
    pub fingerprint: String,
    pub category: EventCategory,
    pub topics: BTreeSet<String>,
    pub breaking: bool,
    pub priority_score: f64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Enrichment>,
}

impl Event {
    /// Attach enrichment, write-once. Returns false if enrichment was
    /// already present (the existing value is kept).
    pub fn set_enrichment(&mut self, enrichment: Enrichment) -> bool {
        if self.enrichment.is_some() {
            return false;
        }
        self.enrichment = Some(enrichment);
        true
    }

    /// Title and body joined for text matching
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        Event {
            id: EventId::new("e-1"),
            source: EventSource::NewsApi,
            title: "title".into(),
            body: "body".into(),
            url: None,
            fingerprint: "fp".into(),
            category: EventCategory::Other,
            topics: BTreeSet::new(),
            breaking: false,
            priority_score: 0.0,
            created_at: Utc::now(),
            enrichment: None,
        }
    }

    #[test]
    fn enrichment_is_write_once() {
        let mut event = sample_event();
        let first = Enrichment {
            sentiment: 0.5,
            entities: vec!["Acme".into()],
            summary: "first".into(),
            keywords: vec![],
        };
        assert!(event.set_enrichment(first.clone()));

        let second = Enrichment {
            sentiment: -0.5,
            entities: vec![],
            summary: "second".into(),
            keywords: vec![],
        };
        assert!(!event.set_enrichment(second));
        assert_eq!(event.enrichment, Some(first));
    }
}
