use thiserror::Error;

/// Result type for ingestion-side pipeline stages.
pub type IngestResult<T> = Result<T, IngestError>;

/// Ingestion errors. Malformed payloads are rejected, never retried.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

/// Enrichment failure. Non-fatal: the event proceeds unenriched and
/// downstream tolerates the missing field.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("language analysis unavailable: {0}")]
    Unavailable(String),
}
