//! Error taxonomy shared by the orchestrator and its collaborators.

use thiserror::Error;

/// Errors surfaced by pipeline operations.
///
/// The reader stage catches `UnsafeUrl` and `Transport` per URL and records
/// them as data; `Parse` is recovered inside the synthesizer. Everything
/// else propagates to the `execute` wrapper, which maps it to a failed run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Requested run or entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Pipeline precondition violation (missing predecessor stage,
    /// duplicate stage, no sources for synthesis, LLM unavailable).
    #[error("{0}")]
    InvalidState(String),

    /// URL rejected before any network I/O.
    #[error("{0}")]
    UnsafeUrl(String),

    /// Network, timeout, or size-cap failure.
    #[error("{0}")]
    Transport(String),

    /// Model output is not valid JSON or fails schema validation.
    #[error("{0}")]
    Parse(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
