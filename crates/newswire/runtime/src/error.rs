use newswire_consensus::ConsensusError;
use newswire_pipeline::IngestError;
use newswire_routing::RoutingError;
use newswire_store::StoreError;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Everything that can stop an event at a pipeline boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error("pipeline is shutting down")]
    ShuttingDown,
}
