use newswire_types::{AgentId, ProposalId};
use thiserror::Error;

/// Result type for decision-engine operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;

/// Voting state-machine errors. These signal caller misuse and are
/// surfaced immediately, never retried.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("proposal {0} is closed")]
    ProposalClosed(ProposalId),

    #[error("proposal {0} is still open")]
    ProposalOpen(ProposalId),

    #[error("agent {0} is not eligible to vote on this proposal")]
    NotEligible(AgentId),

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("invalid proposal: {0}")]
    InvalidProposal(String),
}
