//! Newswire domain types
//!
//! Shared vocabulary for the event pipeline and the consensus engine:
//! identifiers, the canonical event shape, routing subscriptions, and
//! voting proposals. Engines live in their own crates; this crate holds
//! only data and the invariant-preserving methods on it.

#![deny(unsafe_code)]

mod config;
mod event;
mod proposal;
mod subscription;

pub use config::{PipelineConfig, PriorityConfig, RetryPolicy};
pub use event::{Enrichment, Event, EventCategory, EventSource, RawEvent};
pub use proposal::{
    CloseReason, DecisionResult, Proposal, ProposalState, Vote, VoteChoice, VotingScheme,
};
pub use subscription::{Subscription, SubscriptionFilter};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        pub struct $name(pub String);

        impl $name {
            /// Generate a new random id
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Create an id from a known string
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Short display form (first 8 chars)
            pub fn short(&self) -> String {
                self.0.chars().take(8).collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier for an event, assigned at ingestion
    EventId
);
string_id!(
    /// Unique identifier for a routing subscription
    SubscriptionId
);
string_id!(
    /// Unique identifier for a voting proposal
    ProposalId
);
string_id!(
    /// Unique identifier for an agent
    AgentId
);
string_id!(
    /// Identifier for a routing destination (agent inbox or notification channel)
    DestinationId
);
