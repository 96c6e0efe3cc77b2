//! Priority scoring
//!
//! Score = category weight + recency decay + quality factor, with every
//! constant coming from `PriorityConfig`. Pure given a fixed `now`; the
//! caller injects the clock so scoring stays testable.

use chrono::{DateTime, Utc};
use newswire_types::{Event, PriorityConfig};

pub struct Prioritizer {
    config: PriorityConfig,
}

impl Prioritizer {
    pub fn new(config: PriorityConfig) -> Self {
        Self { config }
    }

    /// Compute the urgency score for an event at time `now`.
    ///
    /// `base + recency_weight * 2^(-age / half_life) + quality`, where
    /// quality counts topics (capped) and adds the breaking bonus.
    pub fn score(&self, event: &Event, now: DateTime<Utc>) -> f64 {
        let base = self.config.category_weight(event.category);

        let age_secs = (now - event.created_at).num_seconds().max(0) as f64;
        let half_life = self.config.recency_half_life_secs.max(1) as f64;
        let recency = self.config.recency_weight * (-age_secs / half_life).exp2();

        let topic_count = event.topics.len().min(self.config.topic_cap) as f64;
        let mut quality = self.config.topic_factor * topic_count;
        if event.breaking {
            quality += self.config.breaking_bonus;
        }

        base + recency + quality
    }
}

impl Default for Prioritizer {
    fn default() -> Self {
        Self::new(PriorityConfig::default())
    }
}
