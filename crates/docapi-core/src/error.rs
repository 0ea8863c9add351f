use thiserror::Error;

/// Errors surfaced by the document API client.
///
/// Lock-protocol violations get their own variants because callers branch on
/// them (retry the whole flow, re-acquire the lock, give up). Everything the
/// server rejects that the client cannot classify lands in `Api`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Document {document_id} is locked by another party")]
    Conflict { document_id: String },

    #[error("A lock is required to mutate document {document_id}")]
    LockRequired { document_id: String },

    #[error("Lock id does not match the current holder for document {document_id}")]
    LockMismatch { document_id: String },

    #[error("Lock lease already expired for document {document_id}")]
    ExpiredLock { document_id: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl ApiError {
    /// Fill in the document id on lock and conflict variants.
    ///
    /// The transport classifies errors without knowing which document a call
    /// targeted; call sites attach the id before propagating.
    pub fn for_document(self, document_id: &str) -> Self {
        match self {
            ApiError::Conflict { .. } => ApiError::Conflict {
                document_id: document_id.to_string(),
            },
            ApiError::LockRequired { .. } => ApiError::LockRequired {
                document_id: document_id.to_string(),
            },
            ApiError::LockMismatch { .. } => ApiError::LockMismatch {
                document_id: document_id.to_string(),
            },
            ApiError::ExpiredLock { .. } => ApiError::ExpiredLock {
                document_id: document_id.to_string(),
            },
            other => other,
        }
    }

    /// True for any lock-protocol violation variant.
    pub fn is_lock_violation(&self) -> bool {
        matches!(
            self,
            ApiError::LockRequired { .. }
                | ApiError::LockMismatch { .. }
                | ApiError::ExpiredLock { .. }
        )
    }
}
