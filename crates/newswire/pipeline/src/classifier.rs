//! Keyword-rule event classification
//!
//! Rule sets are immutable records evaluated in a fixed priority order:
//! the first set with at least one match wins the category, while every
//! matched keyword across all sets contributes to the topic set. No
//! randomness anywhere; same input, same output.

use newswire_types::{Event, EventCategory};
use tracing::debug;

/// One keyword group bound to a category.
#[derive(Clone, Debug)]
pub struct RuleSet {
    pub category: EventCategory,
    pub keywords: Vec<String>,
}

impl RuleSet {
    pub fn new(category: EventCategory, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Deterministic keyword/rule classifier.
pub struct Classifier {
    rules: Vec<RuleSet>,
    urgent_keywords: Vec<String>,
}

impl Classifier {
    pub fn new(rules: Vec<RuleSet>, urgent_keywords: &[&str]) -> Self {
        Self {
            rules,
            urgent_keywords: urgent_keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Assign category, topics and the breaking flag.
    ///
    /// The breaking flag is set when the text matches the urgent-keyword
    /// list or the source already marked the payload urgent; breaking
    /// events take the `Breaking` category regardless of keyword matches.
    pub fn classify(&self, mut event: Event) -> Event {
        let text = event.text().to_lowercase();

        let mut category = None;
        for rule in &self.rules {
            let matched: Vec<&String> =
                rule.keywords.iter().filter(|k| text.contains(k.as_str())).collect();
            if matched.is_empty() {
                continue;
            }
            if category.is_none() {
                category = Some(rule.category);
            }
            for keyword in matched {
                event.topics.insert(keyword.clone());
            }
        }

        let urgent = self.urgent_keywords.iter().any(|k| text.contains(k.as_str()));
        event.breaking = event.breaking || urgent;

        event.category = if event.breaking {
            EventCategory::Breaking
        } else {
            category.unwrap_or(EventCategory::Other)
        };
        // The category name is itself a topic, so a plain topic filter
        // can follow a whole category.
        event.topics.insert(event.category.as_str().to_string());

        debug!(
            event_id = %event.id,
            category = %event.category,
            breaking = event.breaking,
            topics = event.topics.len(),
            "Event classified"
        );
        event
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            vec![
                RuleSet::new(
                    EventCategory::Politics,
                    &["election", "government", "policy", "president", "congress"],
                ),
                RuleSet::new(
                    EventCategory::Economy,
                    &["market", "stock", "economy", "trade", "gdp", "inflation"],
                ),
                RuleSet::new(
                    EventCategory::Tech,
                    &["ai", "software", "hardware", "tech", "digital", "cyber"],
                ),
                RuleSet::new(
                    EventCategory::Science,
                    &["research", "discovery", "study", "scientific", "space"],
                ),
                RuleSet::new(
                    EventCategory::Entertainment,
                    &["movie", "music", "celebrity", "film", "show"],
                ),
                RuleSet::new(
                    EventCategory::Sports,
                    &["game", "team", "player", "championship", "league"],
                ),
                RuleSet::new(
                    EventCategory::Health,
                    &["medical", "disease", "health", "hospital", "treatment"],
                ),
                RuleSet::new(
                    EventCategory::Environment,
                    &["climate", "environment", "pollution", "green", "ecology"],
                ),
                RuleSet::new(
                    EventCategory::International,
                    &["global", "international", "foreign", "world"],
                ),
            ],
            &["breaking", "urgent", "alert", "just in", "developing"],
        )
    }
}
