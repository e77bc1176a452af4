use thiserror::Error;

use crate::export::ExportError;
use crate::mirror::MirrorError;
use crate::models::{RecordId, SessionKind, ValidationError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid record: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cannot sync while offline")]
    Connectivity,

    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Bulk session batch mixes {first} and {other} records")]
    BatchTypeMismatch { first: SessionKind, other: SessionKind },

    #[error("Bulk session batch is empty")]
    EmptyBatch,

    #[error("A sync is already in progress")]
    SyncInProgress,

    #[error("Sync was not confirmed: {0}")]
    SyncRejected(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] MirrorError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}
