//! Newswire runtime
//!
//! Composition root for the pipeline: owns the stage chain, the
//! subscription registry, the store, the notifier, and the decision
//! engine, and exposes the outer boundaries (ingestion, query,
//! subscription, voting) behind one type.

#![deny(unsafe_code)]

mod error;
mod pipeline;

pub use error::{PipelineError, PipelineResult};
pub use pipeline::{BatchReport, MaintenanceReport, NewswirePipeline};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, honoring `RUST_LOG`. Safe to
/// call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
