//! Newswire pipeline stages
//!
//! The per-event half of the system: raw payload -> normalize -> classify
//! -> score -> enrich. Every stage is deterministic given its inputs; the
//! enricher is the only stage that talks to an external collaborator and
//! it degrades gracefully when that collaborator is unavailable.

#![deny(unsafe_code)]

mod classifier;
mod enricher;
mod error;
mod normalizer;
mod prioritizer;

pub use classifier::{Classifier, RuleSet};
pub use enricher::{Enricher, HeuristicAnalyzer, LanguageAnalyzer};
pub use error::{EnrichError, IngestError, IngestResult};
pub use normalizer::normalize;
pub use prioritizer::Prioritizer;
