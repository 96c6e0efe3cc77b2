//! Newswire agents
//!
//! Agents are data-configured strategies, not inheritance chains: a
//! profile (role, interests, disposition, weight) drives a deterministic
//! `EventEvaluator`. The council scheduler turns routed events into
//! voting sessions on the decision engine in discrete tick-driven work
//! units.

#![deny(unsafe_code)]

mod memory;
mod profile;
mod scheduler;

pub use memory::AgentMemory;
pub use profile::{AgentProfile, AgentRole, EventEvaluator, ProfileAgent};
pub use scheduler::{CouncilScheduler, CouncilSink, TickOutcome};
