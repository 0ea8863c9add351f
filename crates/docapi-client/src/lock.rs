use std::sync::Arc;

use docapi_core::{ApiError, DocumentLock, LockRequest};
use tracing::{debug, instrument, warn};

use crate::http::{seg, HttpTransport};

/// Client for the server's lease-lock endpoints.
///
/// Holds no lock state of its own: each acquired lock's id and expiry are
/// returned to the caller, who threads the id into subsequent mutating
/// calls. The server is the sole authority on lock lifetime; this client
/// never infers expiry locally and never retries acquisition or renewal
/// internally (blind retries could extend contention, so retry policy is
/// the caller's decision).
pub struct LockClient {
    transport: Arc<HttpTransport>,
}

impl LockClient {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    /// Acquire a lease lock on a document.
    ///
    /// Fails with [`ApiError::Conflict`] when another party holds a live
    /// lock, or [`ApiError::NotFound`] when the document does not exist.
    #[instrument(skip(self), level = "debug")]
    pub async fn lock(
        &self,
        document_id: &str,
        lease_seconds: u64,
    ) -> Result<DocumentLock, ApiError> {
        let path = format!("/api/documents/{}/lock", seg(document_id));
        let body = LockRequest { lease_seconds };
        let lock: DocumentLock = self
            .transport
            .post_json(&path, Some(&body), None)
            .await
            .map_err(|e| e.for_document(document_id))?;
        debug!(
            "Locked document {} with lock {} until {}",
            document_id, lock.lock_id, lock.expires_at
        );
        Ok(lock)
    }

    /// Renew an existing lease, returning the lock with a fresh expiry.
    ///
    /// Must be called with the lock id returned by the most recent
    /// successful lock/renew; a stale id fails with
    /// [`ApiError::LockMismatch`], a lapsed lease with
    /// [`ApiError::ExpiredLock`].
    #[instrument(skip(self), level = "debug")]
    pub async fn renew(
        &self,
        document_id: &str,
        lock_id: &str,
        lease_seconds: u64,
    ) -> Result<DocumentLock, ApiError> {
        let path = format!("/api/documents/{}/lock/renew", seg(document_id));
        let body = LockRequest { lease_seconds };
        let lock: DocumentLock = self
            .transport
            .post_json(&path, Some(&body), Some(lock_id))
            .await
            .map_err(|e| e.for_document(document_id))?;
        debug!(
            "Renewed lock {} on document {} until {}",
            lock.lock_id, document_id, lock.expires_at
        );
        Ok(lock)
    }

    /// Release a lease lock.
    ///
    /// Safe to attempt twice, but the second attempt may fail with
    /// [`ApiError::LockMismatch`]. Cleanup paths that must not mask a
    /// primary failure should use [`LockClient::release`] instead.
    #[instrument(skip(self), level = "debug")]
    pub async fn unlock(&self, document_id: &str, lock_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/documents/{}/unlock", seg(document_id));
        self.transport
            .post_no_content::<()>(&path, None, Some(lock_id))
            .await
            .map_err(|e| e.for_document(document_id))?;
        debug!("Unlocked document {}", document_id);
        Ok(())
    }

    /// Best-effort unlock for cleanup paths.
    ///
    /// The lease expires server-side regardless, so a failed unlock is
    /// logged and swallowed rather than propagated.
    pub async fn release(&self, document_id: &str, lock_id: &str) {
        if let Err(e) = self.unlock(document_id, lock_id).await {
            warn!("Failed to unlock document {}: {}", document_id, e);
        }
    }
}
