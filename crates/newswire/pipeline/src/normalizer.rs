//! Raw payload normalization
//!
//! Converts heterogeneous source payloads into the canonical event shape.
//! Normalization is idempotent: the same payload always yields the same
//! content fingerprint, so duplicate suppression upstream can key on it.

use crate::error::{IngestError, IngestResult};
use newswire_types::{Event, EventCategory, EventId, RawEvent};
use std::collections::BTreeSet;

/// Normalize a raw payload into an `Event`.
///
/// Required payload fields: `body` (or `description`). A missing `title`
/// falls back to "Untitled"; `url` and `tags` are optional. Source and
/// timestamp are carried by the `RawEvent` envelope itself.
///
/// The returned event is not yet routable: category, topics and priority
/// are placeholders until the classifier and prioritizer have run.
pub fn normalize(raw: &RawEvent) -> IngestResult<Event> {
    let payload = raw
        .payload
        .as_object()
        .ok_or_else(|| IngestError::MalformedInput("payload is not an object".to_string()))?;

    let body = payload
        .get("body")
        .or_else(|| payload.get("description"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| IngestError::MalformedInput("missing body".to_string()))?
        .to_string();

    let title = payload
        .get("title")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("Untitled")
        .to_string();

    let url = payload
        .get("url")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let topics: BTreeSet<String> = payload
        .get("tags")
        .and_then(|v| v.as_array())
        .map(|tags| {
            tags.iter()
                .filter_map(|t| t.as_str())
                .map(|t| t.to_lowercase())
                .collect()
        })
        .unwrap_or_default();

    Ok(Event {
        id: EventId::generate(),
        source: raw.source,
        fingerprint: fingerprint(raw, &title, &body),
        title,
        body,
        url,
        category: EventCategory::Other,
        topics,
        breaking: raw.urgent,
        priority_score: 0.0,
        created_at: raw.received_at,
        enrichment: None,
    })
}

/// Business identity of an event: hash of source, title and body.
fn fingerprint(raw: &RawEvent, title: &str, body: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(raw.source.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(title.as_bytes());
    hasher.update(b"\n");
    hasher.update(body.as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use newswire_types::EventSource;
    use serde_json::json;

    #[test]
    fn normalize_accepts_well_formed_payload() {
        let raw = RawEvent::new(
            EventSource::NewsApi,
            json!({
                "title": "Markets rally",
                "body": "Stocks climbed sharply today.",
                "url": "https://example.com/a",
                "tags": ["Markets", "equities"],
            }),
            Utc::now(),
        );

        let event = normalize(&raw).unwrap();
        assert_eq!(event.title, "Markets rally");
        assert_eq!(event.source, EventSource::NewsApi);
        assert!(event.topics.contains("markets"));
        assert!(event.topics.contains("equities"));
        assert!(event.enrichment.is_none());
    }

    #[test]
    fn normalize_rejects_missing_body() {
        let raw = RawEvent::new(
            EventSource::Webhook,
            json!({ "title": "No body here" }),
            Utc::now(),
        );
        assert!(matches!(
            normalize(&raw),
            Err(IngestError::MalformedInput(_))
        ));
    }

    #[test]
    fn normalize_rejects_non_object_payload() {
        let raw = RawEvent::new(EventSource::Api, json!("just a string"), Utc::now());
        assert!(matches!(
            normalize(&raw),
            Err(IngestError::MalformedInput(_))
        ));
    }

    #[test]
    fn same_payload_yields_same_fingerprint() {
        let payload = json!({ "title": "T", "body": "B" });
        let a = normalize(&RawEvent::new(EventSource::RssFeed, payload.clone(), Utc::now()));
        let b = normalize(&RawEvent::new(EventSource::RssFeed, payload, Utc::now()));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn fingerprint_distinguishes_sources() {
        let payload = json!({ "title": "T", "body": "B" });
        let a = normalize(&RawEvent::new(EventSource::RssFeed, payload.clone(), Utc::now()));
        let b = normalize(&RawEvent::new(EventSource::Webhook, payload, Utc::now()));
        assert_ne!(a.unwrap().fingerprint, b.unwrap().fingerprint);
    }
}
