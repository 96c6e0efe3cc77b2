//! Voting proposals
//!
//! A proposal ties an event (or an externally supplied question) to a
//! voting session. Lifecycle is OPEN -> CLOSED, terminal; the result is
//! computed and frozen at close time by the decision engine.

use crate::{AgentId, EventId, ProposalId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How votes on a proposal are aggregated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingScheme {
    Binary,
    MultipleChoice,
    Ranked,
    WeightedConsensus,
}

/// The choice carried by a cast vote
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    /// Yes/no on a binary proposal
    Binary(bool),
    /// One option by name
    Selected(String),
    /// Options in preference order, most preferred first
    Ranked(Vec<String>),
}

/// A vote cast by one agent. One per agent per proposal; a later vote from
/// the same agent replaces the earlier one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vote {
    pub agent: AgentId,
    pub choice: VoteChoice,
    /// Fixed positive consensus weight, supplied at session creation
    pub weight: f64,
    pub cast_at: DateTime<Utc>,
}

/// Proposal lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    Open,
    Closed,
}

/// Why a proposal transitioned to CLOSED
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    AllVoted,
    DeadlineElapsed,
    ForceClosed,
}

/// Frozen outcome of a closed proposal
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecisionResult {
    /// Winning option(s). More than one entry means a tie; ties are
    /// reported, never broken.
    pub winners: Vec<String>,
    /// Aggregate score per option, scheme-dependent
    pub tally: BTreeMap<String, f64>,
    /// Sum of consensus weights across all eligible agents, whether or
    /// not they voted. Together with `winning_share` this lets callers
    /// apply a quorum threshold under partial participation.
    pub total_weight: f64,
    /// weight_sum / total_weight of the single winner. Only populated for
    /// weighted-consensus with an untied winner, so callers can apply
    /// their own quorum threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_share: Option<f64>,
    pub reason: CloseReason,
    pub closed_at: DateTime<Utc>,
}

/// A question submitted to the decision engine for agent voting
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    /// Ordered candidate outcomes, at least two
    pub options: Vec<String>,
    pub scheme: VotingScheme,
    /// Eligible agents with their consensus weights, fixed at creation
    pub eligible: BTreeMap<AgentId, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    pub state: ProposalState,
    pub votes: BTreeMap<AgentId, Vote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DecisionResult>,
    pub created_at: DateTime<Utc>,
}

impl Proposal {
    pub fn is_open(&self) -> bool {
        self.state == ProposalState::Open
    }

    pub fn is_known_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    pub fn all_eligible_voted(&self) -> bool {
        self.eligible.keys().all(|agent| self.votes.contains_key(agent))
    }

    pub fn past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now > deadline)
    }
}
