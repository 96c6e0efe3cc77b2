//! Agent profiles and the evaluation capability
//!
//! A role is configuration, not a subclass: every agent runs the same
//! deterministic evaluation over its profile. The disposition score an
//! agent derives from an event decides its ballot.

use crate::memory::AgentMemory;
use chrono::{DateTime, Duration, Utc};
use newswire_types::{AgentId, Event, VoteChoice};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::debug;

/// Council roles. The role only shifts the evaluation bias.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Analyst,
    Skeptic,
    Advocate,
    Moderator,
}

impl AgentRole {
    /// Fixed bias each role applies to its disposition score.
    fn bias(&self) -> f64 {
        match self {
            AgentRole::Analyst => 0.0,
            AgentRole::Skeptic => -0.25,
            AgentRole::Advocate => 0.25,
            AgentRole::Moderator => 0.0,
        }
    }
}

/// Data-configured agent strategy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: AgentId,
    pub role: AgentRole,
    /// Topics this agent cares about; overlap with an event's topics
    /// raises its disposition.
    pub interests: Vec<String>,
    /// Baseline disposition in [0, 1]; 0.5 is neutral.
    pub optimism: f64,
    /// Consensus weight carried into voting sessions.
    pub weight: f64,
}

impl AgentProfile {
    pub fn new(id: impl Into<String>, role: AgentRole) -> Self {
        Self {
            id: AgentId::new(id),
            role,
            interests: Vec::new(),
            optimism: 0.5,
            weight: 1.0,
        }
    }

    pub fn with_interests(mut self, interests: &[&str]) -> Self {
        self.interests = interests.iter().map(|i| i.to_string()).collect();
        self
    }

    pub fn with_optimism(mut self, optimism: f64) -> Self {
        self.optimism = optimism.clamp(0.0, 1.0);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// The evaluation capability: how an agent turns a routed event into a
/// ballot over the proposal's options.
pub trait EventEvaluator: Send + Sync {
    fn agent_id(&self) -> &AgentId;
    fn weight(&self) -> f64;
    fn evaluate(&self, event: &Event, options: &[String]) -> VoteChoice;
}

const MEMORY_CAPACITY: usize = 128;
const MEMORY_TTL_HOURS: i64 = 24;

/// Profile-driven agent with bounded memory of what it has seen.
pub struct ProfileAgent {
    profile: AgentProfile,
    memory: Mutex<AgentMemory>,
}

impl ProfileAgent {
    pub fn new(profile: AgentProfile) -> Self {
        Self {
            profile,
            memory: Mutex::new(AgentMemory::new(
                MEMORY_CAPACITY,
                Some(Duration::hours(MEMORY_TTL_HOURS)),
            )),
        }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Disposition toward an event: interest overlap, enriched sentiment,
    /// breaking urgency, the agent's own optimism, and the role bias.
    /// Positive means "in favor".
    fn disposition(&self, event: &Event) -> f64 {
        let overlap = self
            .profile
            .interests
            .iter()
            .filter(|interest| event.topics.contains(*interest))
            .count() as f64;
        let sentiment = event.enrichment.as_ref().map_or(0.0, |e| e.sentiment);
        let urgency = if event.breaking { 0.2 } else { 0.0 };

        0.2 * overlap + 0.3 * sentiment + urgency + (self.profile.optimism - 0.5)
            + self.profile.role.bias()
    }

    fn remember(&self, event: &Event, disposition: f64, now: DateTime<Utc>) {
        let mut memory = self.memory.lock().unwrap_or_else(|e| e.into_inner());
        memory.remember(event.id.0.clone(), format!("{disposition:.3}"), now);
    }

    /// What this agent remembers about an event, if anything.
    pub fn recall(&self, event_id: &str, now: DateTime<Utc>) -> Option<String> {
        let mut memory = self.memory.lock().unwrap_or_else(|e| e.into_inner());
        memory.recall(event_id, now)
    }
}

impl EventEvaluator for ProfileAgent {
    fn agent_id(&self) -> &AgentId {
        &self.profile.id
    }

    fn weight(&self) -> f64 {
        self.profile.weight
    }

    fn evaluate(&self, event: &Event, options: &[String]) -> VoteChoice {
        let disposition = self.disposition(event);
        self.remember(event, disposition, Utc::now());
        debug!(
            agent = %self.profile.id,
            event_id = %event.id,
            disposition,
            "Agent evaluated event"
        );

        if options.is_empty() || (options.len() == 2 && options[0] == "yes" && options[1] == "no") {
            return VoteChoice::Binary(disposition >= 0.0);
        }

        // For named options the agent picks deterministically from its
        // disposition and the event fingerprint, so repeated evaluation
        // of the same event is stable.
        let seed: u64 = event
            .fingerprint
            .bytes()
            .chain(self.profile.id.0.bytes())
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let index = (seed % options.len() as u64) as usize;
        VoteChoice::Selected(options[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newswire_types::{Enrichment, EventCategory, EventId, EventSource};
    use std::collections::BTreeSet;

    fn event(topics: &[&str], sentiment: Option<f64>) -> Event {
        Event {
            id: EventId::new("e-1"),
            source: EventSource::NewsApi,
            title: "t".into(),
            body: "b".into(),
            url: None,
            fingerprint: "fp".into(),
            category: EventCategory::Tech,
            topics: topics.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            breaking: false,
            priority_score: 1.0,
            created_at: Utc::now(),
            enrichment: sentiment.map(|s| Enrichment {
                sentiment: s,
                entities: vec![],
                summary: String::new(),
                keywords: vec![],
            }),
        }
    }

    fn binary_options() -> Vec<String> {
        vec!["yes".to_string(), "no".to_string()]
    }

    #[test]
    fn interested_advocate_votes_yes() {
        let agent = ProfileAgent::new(
            AgentProfile::new("advocate", AgentRole::Advocate).with_interests(&["ai"]),
        );
        let choice = agent.evaluate(&event(&["ai", "tech"], Some(0.5)), &binary_options());
        assert_eq!(choice, VoteChoice::Binary(true));
    }

    #[test]
    fn skeptic_votes_no_on_negative_news_outside_its_interests() {
        let agent = ProfileAgent::new(
            AgentProfile::new("skeptic", AgentRole::Skeptic).with_interests(&["economy"]),
        );
        let choice = agent.evaluate(&event(&["sports"], Some(-0.8)), &binary_options());
        assert_eq!(choice, VoteChoice::Binary(false));
    }

    #[test]
    fn missing_enrichment_is_tolerated() {
        let agent = ProfileAgent::new(AgentProfile::new("analyst", AgentRole::Analyst));
        // No enrichment: sentiment contributes zero, vote still possible.
        let choice = agent.evaluate(&event(&[], None), &binary_options());
        assert_eq!(choice, VoteChoice::Binary(true));
    }

    #[test]
    fn named_option_pick_is_deterministic() {
        let agent = ProfileAgent::new(AgentProfile::new("a", AgentRole::Analyst));
        let options = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let first = agent.evaluate(&event(&[], None), &options);
        let second = agent.evaluate(&event(&[], None), &options);
        assert_eq!(first, second);
    }

    #[test]
    fn evaluation_is_recorded_in_memory() {
        let agent = ProfileAgent::new(AgentProfile::new("a", AgentRole::Analyst));
        agent.evaluate(&event(&[], None), &binary_options());
        assert!(agent.recall("e-1", Utc::now()).is_some());
    }
}
