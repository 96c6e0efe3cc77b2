//! Tunable pipeline constants
//!
//! Exact weights and horizons are deliberately configuration, not
//! hard-coded behavior. Defaults follow the shipped category table.

use crate::EventCategory;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weights feeding the priority score
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriorityConfig {
    /// Base weight per category
    pub category_weights: BTreeMap<EventCategory, f64>,
    /// Half-life of the recency decay, in seconds
    pub recency_half_life_secs: u64,
    /// Multiplier on the recency decay term
    pub recency_weight: f64,
    /// Contribution per topic, up to `topic_cap` topics
    pub topic_factor: f64,
    pub topic_cap: usize,
    /// Flat bonus for breaking events
    pub breaking_bonus: f64,
}

impl PriorityConfig {
    pub fn category_weight(&self, category: EventCategory) -> f64 {
        self.category_weights.get(&category).copied().unwrap_or(1.0)
    }

    pub fn recency_half_life(&self) -> Duration {
        Duration::seconds(self.recency_half_life_secs as i64)
    }
}

impl Default for PriorityConfig {
    fn default() -> Self {
        let category_weights = [
            (EventCategory::Breaking, 2.0),
            (EventCategory::Politics, 1.5),
            (EventCategory::International, 1.4),
            (EventCategory::Economy, 1.3),
            (EventCategory::Tech, 1.2),
            (EventCategory::Science, 1.1),
            (EventCategory::Health, 1.1),
            (EventCategory::Environment, 1.0),
            (EventCategory::Sports, 0.8),
            (EventCategory::Entertainment, 0.7),
            (EventCategory::Other, 0.5),
        ]
        .into_iter()
        .collect();

        Self {
            category_weights,
            recency_half_life_secs: 3600,
            recency_weight: 1.0,
            topic_factor: 0.1,
            topic_cap: 5,
            breaking_bonus: 1.0,
        }
    }
}

/// Bounded retry with exponential backoff for notification delivery
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
}

impl RetryPolicy {
    /// Backoff after the given 1-based failed attempt: base, 2*base,
    /// 4*base, ...
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_backoff_ms.saturating_mul(1u64 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 50,
        }
    }
}

/// Pipeline-wide tunables
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum in-flight events per pipeline stage
    pub stage_concurrency: usize,
    /// Events older than this are dropped by the retention sweep, in seconds
    pub retention_secs: u64,
    pub priority: PriorityConfig,
    pub retry: RetryPolicy,
}

impl PipelineConfig {
    pub fn retention_horizon(&self) -> Duration {
        Duration::seconds(self.retention_secs as i64)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_concurrency: 8,
            retention_secs: 24 * 3600,
            priority: PriorityConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}
