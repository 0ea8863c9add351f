use serde::{Deserialize, Serialize};

/// Body for lock acquire and renew calls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest {
    pub lease_seconds: u64,
}

/// A server-granted lease lock on a document.
///
/// The lock is opaque beyond its id and expiry: the client never infers
/// expiry locally and trusts the server's responses. The caller that
/// acquired (or last renewed) the lock owns it until unlock or lease
/// expiry, and is responsible for threading `lock_id` into every mutating
/// call on the document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLock {
    pub document_id: String,
    pub lock_id: String,
    #[serde(default)]
    pub locked_by: Option<String>,
    #[serde(alias = "lockExpiresAt")]
    pub expires_at: chrono::DateTime<chrono::Utc>,
}
