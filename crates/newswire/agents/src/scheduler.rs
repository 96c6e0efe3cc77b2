//! Council scheduler
//!
//! Drives the agent council: routed events queue up in an inbox, and
//! each tick opens a voting session per event, collects every agent's
//! ballot, and reads back the decision once the session auto-closes.

use crate::profile::EventEvaluator;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use newswire_consensus::{ConsensusError, DecisionEngine, ProposalSpec};
use newswire_notify::{EventSink, NotifyResult};
use newswire_types::{DecisionResult, Event, ProposalId, VotingScheme};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Result of putting one event in front of the council.
#[derive(Clone, Debug)]
pub struct TickOutcome {
    pub event: Event,
    pub proposal_id: ProposalId,
    /// Present when every agent voted and the session closed.
    pub decision: Option<DecisionResult>,
}

/// Schedules voting sessions over queued events.
pub struct CouncilScheduler {
    agents: Vec<Arc<dyn EventEvaluator>>,
    engine: Arc<DecisionEngine>,
    inbox: Mutex<VecDeque<Event>>,
}

impl CouncilScheduler {
    pub fn new(engine: Arc<DecisionEngine>) -> Self {
        Self {
            agents: Vec::new(),
            engine,
            inbox: Mutex::new(VecDeque::new()),
        }
    }

    pub fn register(&mut self, agent: Arc<dyn EventEvaluator>) {
        self.agents.push(agent);
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Queue an event for the next tick.
    pub fn enqueue(&self, event: Event) {
        let mut inbox = self.inbox.lock().unwrap_or_else(|e| e.into_inner());
        inbox.push_back(event);
    }

    pub fn pending(&self) -> usize {
        let inbox = self.inbox.lock().unwrap_or_else(|e| e.into_inner());
        inbox.len()
    }

    /// Drain the inbox, running one voting session per queued event.
    /// Sessions with a full ballot close inside the tick; the outcome
    /// carries the decision when that happened.
    pub fn tick(&self, now: DateTime<Utc>) -> Vec<TickOutcome> {
        let drained: Vec<Event> = {
            let mut inbox = self.inbox.lock().unwrap_or_else(|e| e.into_inner());
            inbox.drain(..).collect()
        };

        let mut outcomes = Vec::with_capacity(drained.len());
        for event in drained {
            match self.convene(&event, now) {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => {
                    warn!(event_id = %event.id, %error, "Voting session failed");
                }
            }
        }
        outcomes
    }

    fn convene(&self, event: &Event, now: DateTime<Utc>) -> Result<TickOutcome, ConsensusError> {
        let mut spec = ProposalSpec::new(
            VotingScheme::WeightedConsensus,
            vec!["yes".to_string(), "no".to_string()],
            self.agents.iter().map(|a| a.agent_id().clone()).collect(),
        )
        .for_event(event.id.clone());
        for agent in &self.agents {
            spec = spec.with_weight(agent.agent_id().clone(), agent.weight());
        }

        let proposal_id = self.engine.create_proposal(spec, now)?;
        let options = vec!["yes".to_string(), "no".to_string()];
        for agent in &self.agents {
            let choice = agent.evaluate(event, &options);
            self.engine
                .cast_vote(&proposal_id, agent.agent_id().clone(), choice, now)?;
        }

        let decision = self.engine.result(&proposal_id).ok();
        if let Some(result) = &decision {
            info!(
                event_id = %event.id,
                proposal_id = %proposal_id,
                winners = ?result.winners,
                "Council decided"
            );
        }
        Ok(TickOutcome {
            event: event.clone(),
            proposal_id,
            decision,
        })
    }
}

/// Delivery sink that feeds routed events into a council inbox. Register
/// it against a subscription destination to put that destination's
/// traffic in front of the agents.
pub struct CouncilSink {
    scheduler: Arc<CouncilScheduler>,
}

impl CouncilSink {
    pub fn new(scheduler: Arc<CouncilScheduler>) -> Self {
        Self { scheduler }
    }
}

#[async_trait]
impl EventSink for CouncilSink {
    async fn deliver(&self, event: &Event) -> NotifyResult<()> {
        self.scheduler.enqueue(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{AgentProfile, AgentRole, ProfileAgent};
    use newswire_types::{EventCategory, EventId, EventSource};
    use std::collections::BTreeSet;

    fn event(id: &str) -> Event {
        Event {
            id: EventId::new(id),
            source: EventSource::NewsApi,
            title: "t".into(),
            body: "b".into(),
            url: None,
            fingerprint: format!("fp-{id}"),
            category: EventCategory::Tech,
            topics: BTreeSet::new(),
            breaking: false,
            priority_score: 1.0,
            created_at: Utc::now(),
            enrichment: None,
        }
    }

    fn council() -> CouncilScheduler {
        let mut scheduler = CouncilScheduler::new(Arc::new(DecisionEngine::new()));
        scheduler.register(Arc::new(ProfileAgent::new(
            AgentProfile::new("analyst", AgentRole::Analyst).with_weight(2.0),
        )));
        scheduler.register(Arc::new(ProfileAgent::new(AgentProfile::new(
            "skeptic",
            AgentRole::Skeptic,
        ))));
        scheduler.register(Arc::new(ProfileAgent::new(AgentProfile::new(
            "advocate",
            AgentRole::Advocate,
        ))));
        scheduler
    }

    #[test]
    fn tick_runs_one_session_per_queued_event() {
        let scheduler = council();
        scheduler.enqueue(event("e-1"));
        scheduler.enqueue(event("e-2"));

        let outcomes = scheduler.tick(Utc::now());
        assert_eq!(outcomes.len(), 2);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn full_ballot_closes_the_session_within_the_tick() {
        let scheduler = council();
        scheduler.enqueue(event("e-1"));

        let outcomes = scheduler.tick(Utc::now());
        let decision = outcomes[0].decision.as_ref().unwrap();
        // Every registered agent voted exactly once.
        assert_eq!(decision.tally.values().sum::<f64>(), 4.0);
        assert_eq!(decision.total_weight, 4.0);
    }

    #[test]
    fn empty_inbox_produces_no_outcomes() {
        let scheduler = council();
        assert!(scheduler.tick(Utc::now()).is_empty());
    }

    #[tokio::test]
    async fn sink_feeds_the_inbox() {
        let scheduler = Arc::new(council());
        let sink = CouncilSink::new(Arc::clone(&scheduler));
        sink.deliver(&event("e-1")).await.unwrap();
        assert_eq!(scheduler.pending(), 1);
    }
}
