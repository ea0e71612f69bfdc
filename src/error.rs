//! Failure taxonomy for the extraction pipeline.
//!
//! Every variant is a hard failure for the current document; nothing is
//! retried internally. The handler layer in `main.rs` is the only place
//! these cross into the structured failure envelope.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Preprocessing precondition violated (empty or zero-dimension image).
    #[error("invalid page image: {0}")]
    InvalidImage(String),

    /// The PDF container is missing, corrupt, or not a PDF at all.
    #[error("failed to open document: {0}")]
    DocumentOpen(String),

    /// Page-to-image conversion failed.
    #[error("page rasterization failed: {0}")]
    Rasterization(String),

    /// The optical recognition engine is unavailable or misconfigured.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}
