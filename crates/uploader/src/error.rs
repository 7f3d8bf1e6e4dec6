//! Upload error taxonomy.
//!
//! Only progress reporting is recovered locally (inside the pipeline);
//! everything below surfaces to the batch level and stops the remaining
//! files. There is no per-file retry and no skip-and-continue.

use fastpush_catalog::CatalogError;
use fastpush_transfer::TransferError;

/// Errors produced while uploading a batch.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("gateway error: {0}")]
    Gateway(String),
}
