//! Event enrichment
//!
//! Attaches sentiment, entities, a summary and keywords via a
//! language-analysis collaborator. Enrichment is write-once and strictly
//! best-effort: if the collaborator fails, the event proceeds unenriched
//! and the caller is told via `EnrichError::Unavailable`.

use crate::error::EnrichError;
use async_trait::async_trait;
use newswire_types::{Enrichment, Event};
use std::collections::HashMap;
use tracing::{debug, warn};

/// External language-analysis collaborator.
#[async_trait]
pub trait LanguageAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<Enrichment, EnrichError>;
}

/// Enrichment stage wrapping a `LanguageAnalyzer`.
pub struct Enricher {
    analyzer: Box<dyn LanguageAnalyzer>,
}

impl Enricher {
    pub fn new(analyzer: impl LanguageAnalyzer + 'static) -> Self {
        Self {
            analyzer: Box::new(analyzer),
        }
    }

    /// Fill the event's enrichment field. A second call on an already
    /// enriched event is a no-op keeping the existing value.
    pub async fn enrich(&self, event: &mut Event) -> Result<(), EnrichError> {
        if event.enrichment.is_some() {
            debug!(event_id = %event.id, "Event already enriched, keeping existing value");
            return Ok(());
        }

        match self.analyzer.analyze(&event.text()).await {
            Ok(enrichment) => {
                event.set_enrichment(enrichment);
                debug!(event_id = %event.id, "Event enriched");
                Ok(())
            }
            Err(err) => {
                warn!(event_id = %event.id, error = %err, "Enrichment unavailable, continuing without");
                Err(err)
            }
        }
    }
}

/// Built-in deterministic analyzer so the pipeline runs without a network
/// collaborator. Capitalized words become entities, frequent long words
/// become keywords, and sentiment comes from a small cue-word lexicon.
#[derive(Default)]
pub struct HeuristicAnalyzer;

const POSITIVE_CUES: &[&str] = &["gain", "growth", "record", "success", "win", "rally"];
const NEGATIVE_CUES: &[&str] = &["crash", "crisis", "loss", "decline", "fail", "death"];
const SUMMARY_LIMIT: usize = 100;
const KEYWORD_LIMIT: usize = 5;

#[async_trait]
impl LanguageAnalyzer for HeuristicAnalyzer {
    async fn analyze(&self, text: &str) -> Result<Enrichment, EnrichError> {
        Ok(Enrichment {
            sentiment: sentiment(text),
            entities: entities(text),
            summary: summary(text),
            keywords: keywords(text),
        })
    }
}

fn sentiment(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let positive = POSITIVE_CUES.iter().filter(|c| lower.contains(*c)).count() as f64;
    let negative = NEGATIVE_CUES.iter().filter(|c| lower.contains(*c)).count() as f64;
    let total = positive + negative;
    if total == 0.0 {
        0.0
    } else {
        ((positive - negative) / total).clamp(-1.0, 1.0)
    }
}

fn entities(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for word in text.split_whitespace() {
        let clean = word.trim_matches(|c: char| !c.is_alphanumeric());
        if clean.len() > 1
            && clean.chars().next().is_some_and(|c| c.is_uppercase())
            && !seen.iter().any(|e| e == clean)
        {
            seen.push(clean.to_string());
        }
    }
    seen
}

fn summary(text: &str) -> String {
    if text.chars().count() <= SUMMARY_LIMIT {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(SUMMARY_LIMIT).collect();
        format!("{truncated}...")
    }
}

fn keywords(text: &str) -> Vec<String> {
    let mut frequency: HashMap<String, usize> = HashMap::new();
    for word in text.to_lowercase().split_whitespace() {
        let clean = word.trim_matches(|c: char| !c.is_alphanumeric());
        if clean.len() > 4 {
            *frequency.entry(clean.to_string()).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = frequency.into_iter().collect();
    // Stable output: frequency descending, then alphabetically
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(KEYWORD_LIMIT).map(|(w, _)| w).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use newswire_types::{EventCategory, EventId, EventSource};
    use std::collections::BTreeSet;

    fn event(body: &str) -> Event {
        Event {
            id: EventId::new("e-1"),
            source: EventSource::NewsApi,
            title: "Acme Results".into(),
            body: body.into(),
            url: None,
            fingerprint: "fp".into(),
            category: EventCategory::Economy,
            topics: BTreeSet::new(),
            breaking: false,
            priority_score: 0.0,
            created_at: Utc::now(),
            enrichment: None,
        }
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl LanguageAnalyzer for FailingAnalyzer {
        async fn analyze(&self, _text: &str) -> Result<Enrichment, EnrichError> {
            Err(EnrichError::Unavailable("collaborator down".to_string()))
        }
    }

    #[tokio::test]
    async fn enrich_fills_all_fields() {
        let enricher = Enricher::new(HeuristicAnalyzer);
        let mut e = event("Acme posted record growth and Paris markets followed.");
        enricher.enrich(&mut e).await.unwrap();

        let enrichment = e.enrichment.unwrap();
        assert!(enrichment.sentiment > 0.0);
        assert!(enrichment.entities.contains(&"Acme".to_string()));
        assert!(enrichment.entities.contains(&"Paris".to_string()));
        assert!(!enrichment.summary.is_empty());
    }

    #[tokio::test]
    async fn second_enrich_keeps_first_value() {
        let enricher = Enricher::new(HeuristicAnalyzer);
        let mut e = event("Record growth.");
        enricher.enrich(&mut e).await.unwrap();
        let first = e.enrichment.clone();

        e.body = "Total crash and crisis.".into();
        enricher.enrich(&mut e).await.unwrap();
        assert_eq!(e.enrichment, first);
    }

    #[tokio::test]
    async fn analyzer_failure_leaves_event_unenriched() {
        let enricher = Enricher::new(FailingAnalyzer);
        let mut e = event("anything");
        let result = enricher.enrich(&mut e).await;
        assert!(matches!(result, Err(EnrichError::Unavailable(_))));
        assert!(e.enrichment.is_none());
    }

    #[tokio::test]
    async fn long_body_is_truncated_in_summary() {
        let enricher = Enricher::new(HeuristicAnalyzer);
        let mut e = event(&"a".repeat(400));
        enricher.enrich(&mut e).await.unwrap();
        let summary = e.enrichment.unwrap().summary;
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() <= SUMMARY_LIMIT + 3);
    }
}
