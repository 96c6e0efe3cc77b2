//! Decision engine
//!
//! Accepts votes from participating agents on proposals, aggregates them
//! under the chosen voting scheme, and freezes a result when the proposal
//! closes. OPEN -> CLOSED is the only transition and it is terminal.
//!
//! Vote acceptance and closing are serialized per proposal behind a
//! per-proposal mutex; distinct proposals proceed concurrently.

#![deny(unsafe_code)]

mod aggregate;
mod error;

pub use error::{ConsensusError, ConsensusResult};

use aggregate::aggregate;
use chrono::{DateTime, Utc};
use newswire_types::{
    AgentId, CloseReason, DecisionResult, EventId, Proposal, ProposalId, ProposalState, Vote,
    VoteChoice, VotingScheme,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

/// Parameters for a new voting session.
pub struct ProposalSpec {
    pub event_id: Option<EventId>,
    pub options: Vec<String>,
    pub scheme: VotingScheme,
    pub eligible_agents: Vec<AgentId>,
    /// Consensus weights; agents not listed default to 1.0. Fixed for the
    /// lifetime of the session.
    pub weights: HashMap<AgentId, f64>,
    pub deadline: Option<DateTime<Utc>>,
}

impl ProposalSpec {
    pub fn new(scheme: VotingScheme, options: Vec<String>, eligible_agents: Vec<AgentId>) -> Self {
        Self {
            event_id: None,
            options,
            scheme,
            eligible_agents,
            weights: HashMap::new(),
            deadline: None,
        }
    }

    pub fn for_event(mut self, event_id: EventId) -> Self {
        self.event_id = Some(event_id);
        self
    }

    pub fn with_weight(mut self, agent: AgentId, weight: f64) -> Self {
        self.weights.insert(agent, weight);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// The decision engine: proposal registry plus per-proposal locking.
#[derive(Default)]
pub struct DecisionEngine {
    proposals: RwLock<HashMap<ProposalId, Arc<Mutex<Proposal>>>>,
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new voting session.
    pub fn create_proposal(&self, spec: ProposalSpec, now: DateTime<Utc>) -> ConsensusResult<ProposalId> {
        let options = if spec.options.is_empty() && spec.scheme == VotingScheme::Binary {
            vec!["yes".to_string(), "no".to_string()]
        } else {
            spec.options
        };

        if options.len() < 2 {
            return Err(ConsensusError::InvalidProposal(
                "a proposal needs at least two options".to_string(),
            ));
        }
        if spec.eligible_agents.is_empty() {
            return Err(ConsensusError::InvalidProposal(
                "a proposal needs at least one eligible agent".to_string(),
            ));
        }

        let mut eligible = BTreeMap::new();
        for agent in spec.eligible_agents {
            let weight = spec.weights.get(&agent).copied().unwrap_or(1.0);
            if weight <= 0.0 {
                return Err(ConsensusError::InvalidProposal(format!(
                    "agent {agent} has non-positive weight {weight}"
                )));
            }
            eligible.insert(agent, weight);
        }

        let proposal = Proposal {
            id: ProposalId::generate(),
            event_id: spec.event_id,
            options,
            scheme: spec.scheme,
            eligible,
            deadline: spec.deadline,
            state: ProposalState::Open,
            votes: BTreeMap::new(),
            result: None,
            created_at: now,
        };

        let id = proposal.id.clone();
        self.proposals
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), Arc::new(Mutex::new(proposal)));
        info!(proposal_id = %id, "Proposal created");
        Ok(id)
    }

    /// Cast a vote. A later vote from the same agent overwrites the
    /// earlier one; votes on a closed proposal are rejected, not queued.
    /// A vote arriving past the deadline closes the proposal first and is
    /// then rejected.
    pub fn cast_vote(
        &self,
        proposal_id: &ProposalId,
        agent: AgentId,
        choice: VoteChoice,
        now: DateTime<Utc>,
    ) -> ConsensusResult<()> {
        let handle = self.handle(proposal_id)?;
        let mut proposal = handle.lock().unwrap_or_else(|e| e.into_inner());

        if !proposal.is_open() {
            return Err(ConsensusError::ProposalClosed(proposal_id.clone()));
        }
        if proposal.past_deadline(now) {
            finalize(&mut proposal, CloseReason::DeadlineElapsed, now);
            return Err(ConsensusError::ProposalClosed(proposal_id.clone()));
        }

        let Some(weight) = proposal.eligible.get(&agent).copied() else {
            return Err(ConsensusError::NotEligible(agent));
        };
        validate_choice(&proposal, &choice)?;

        let replaced = proposal
            .votes
            .insert(
                agent.clone(),
                Vote {
                    agent: agent.clone(),
                    choice,
                    weight,
                    cast_at: now,
                },
            )
            .is_some();
        debug!(
            proposal_id = %proposal_id,
            agent = %agent,
            replaced,
            votes = proposal.votes.len(),
            "Vote recorded"
        );

        if proposal.all_eligible_voted() {
            finalize(&mut proposal, CloseReason::AllVoted, now);
        }
        Ok(())
    }

    /// Explicit close. Idempotent: closing an already closed proposal
    /// returns the frozen result unchanged.
    pub fn close(&self, proposal_id: &ProposalId, now: DateTime<Utc>) -> ConsensusResult<DecisionResult> {
        let handle = self.handle(proposal_id)?;
        let mut proposal = handle.lock().unwrap_or_else(|e| e.into_inner());

        if proposal.is_open() {
            finalize(&mut proposal, CloseReason::ForceClosed, now);
        }
        proposal
            .result
            .clone()
            .ok_or_else(|| ConsensusError::ProposalOpen(proposal_id.clone()))
    }

    /// Frozen result of a closed proposal. Use `tally` for a live read.
    pub fn result(&self, proposal_id: &ProposalId) -> ConsensusResult<DecisionResult> {
        let handle = self.handle(proposal_id)?;
        let proposal = handle.lock().unwrap_or_else(|e| e.into_inner());
        proposal
            .result
            .clone()
            .ok_or_else(|| ConsensusError::ProposalOpen(proposal_id.clone()))
    }

    /// Current tally, explicitly allowed while the proposal is open.
    pub fn tally(&self, proposal_id: &ProposalId) -> ConsensusResult<BTreeMap<String, f64>> {
        let handle = self.handle(proposal_id)?;
        let proposal = handle.lock().unwrap_or_else(|e| e.into_inner());
        let snapshot = aggregate(&proposal, CloseReason::ForceClosed, Utc::now());
        Ok(snapshot.tally)
    }

    /// Snapshot of a proposal.
    pub fn get(&self, proposal_id: &ProposalId) -> Option<Proposal> {
        let proposals = self.proposals.read().unwrap_or_else(|e| e.into_inner());
        proposals
            .get(proposal_id)
            .map(|handle| handle.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    /// Close every open proposal whose deadline has elapsed. Returns the
    /// ids that were closed.
    pub fn sweep_deadlines(&self, now: DateTime<Utc>) -> Vec<ProposalId> {
        let handles: Vec<(ProposalId, Arc<Mutex<Proposal>>)> = {
            let proposals = self.proposals.read().unwrap_or_else(|e| e.into_inner());
            proposals
                .iter()
                .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
                .collect()
        };

        let mut closed = Vec::new();
        for (id, handle) in handles {
            let mut proposal = handle.lock().unwrap_or_else(|e| e.into_inner());
            if proposal.is_open() && proposal.past_deadline(now) {
                finalize(&mut proposal, CloseReason::DeadlineElapsed, now);
                closed.push(id);
            }
        }
        if !closed.is_empty() {
            info!(count = closed.len(), "Expired proposals closed");
        }
        closed
    }

    /// Ids of proposals still accepting votes.
    pub fn open_proposals(&self) -> Vec<ProposalId> {
        let proposals = self.proposals.read().unwrap_or_else(|e| e.into_inner());
        proposals
            .iter()
            .filter(|(_, handle)| handle.lock().unwrap_or_else(|e| e.into_inner()).is_open())
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn handle(&self, proposal_id: &ProposalId) -> ConsensusResult<Arc<Mutex<Proposal>>> {
        let proposals = self.proposals.read().unwrap_or_else(|e| e.into_inner());
        proposals
            .get(proposal_id)
            .cloned()
            .ok_or_else(|| ConsensusError::ProposalNotFound(proposal_id.clone()))
    }
}

/// Compute and freeze the result. Callers hold the proposal lock, so two
/// concurrent closing triggers cannot double-finalize.
fn finalize(proposal: &mut MutexGuard<'_, Proposal>, reason: CloseReason, now: DateTime<Utc>) {
    if proposal.state == ProposalState::Closed {
        return;
    }
    let result = aggregate(proposal, reason, now);
    if result.winners.len() > 1 {
        warn!(
            proposal_id = %proposal.id,
            tied = result.winners.len(),
            "Proposal closed with a tie"
        );
    }
    proposal.result = Some(result);
    proposal.state = ProposalState::Closed;
    info!(proposal_id = %proposal.id, reason = ?reason, "Proposal closed");
}

fn validate_choice(proposal: &Proposal, choice: &VoteChoice) -> ConsensusResult<()> {
    match choice {
        VoteChoice::Binary(yes) => {
            if proposal.scheme == VotingScheme::Ranked {
                return Err(ConsensusError::UnknownOption(
                    "ranked proposals need a ranked ballot".to_string(),
                ));
            }
            // A binary ballot is shorthand for its option string; it is
            // only valid when that option is actually on the proposal.
            let option = if *yes { "yes" } else { "no" };
            if proposal.is_known_option(option) {
                Ok(())
            } else {
                Err(ConsensusError::UnknownOption(option.to_string()))
            }
        }
        VoteChoice::Selected(option) => {
            if proposal.is_known_option(option) {
                Ok(())
            } else {
                Err(ConsensusError::UnknownOption(option.clone()))
            }
        }
        VoteChoice::Ranked(ranking) => {
            if ranking.is_empty() {
                return Err(ConsensusError::UnknownOption("empty ranking".to_string()));
            }
            let mut seen = std::collections::BTreeSet::new();
            for option in ranking {
                if !proposal.is_known_option(option) {
                    return Err(ConsensusError::UnknownOption(option.clone()));
                }
                if !seen.insert(option) {
                    return Err(ConsensusError::UnknownOption(format!(
                        "option ranked twice: {option}"
                    )));
                }
            }
            Ok(())
        }
    }
}
