use serde::{Deserialize, Serialize};

/// Body for `POST /api/documents/{id}/attachments/multipart`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInitRequest {
    pub file_name: String,
    pub content_type: String,
    pub file_size: u64,
    /// Client hint only; the server's choice in the response wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_size_bytes: Option<u64>,
}

/// Server-tracked multipart upload session, as returned by "initiate".
///
/// `session_id` is the client's handle: it must accompany every subsequent
/// call for this session, together with the governing lock id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSession {
    pub session_id: String,
    pub upload_id: String,
    #[serde(alias = "s3Key")]
    pub storage_key: String,
    pub bucket: String,
    #[serde(default)]
    pub part_size_bytes: Option<u64>,
}

/// Per-part presigned URL returned by "presign-part".
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedPart {
    pub session_id: String,
    pub part_number: u32,
    pub presigned_url: String,
    #[serde(default)]
    pub expires_in_seconds: Option<u64>,
}

/// A part successfully stored, keyed by its 1-based contiguous number.
///
/// The digest is the storage layer's opaque content digest (the ETag of the
/// direct PUT). The exact `eTag` casing is part of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    #[serde(rename = "partNumber")]
    pub part_number: u32,
    #[serde(rename = "eTag")]
    pub e_tag: String,
}

/// Body for the "complete" call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCompleteRequest {
    pub parts: Vec<CompletedPart>,
}

/// The materialized attachment returned by "complete".
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCompleteResponse {
    pub session_id: String,
    pub attachment_id: String,
    #[serde(alias = "s3Key")]
    pub storage_key: String,
    pub bucket: String,
}

/// Server-side bookkeeping for an upload session (read-only status call).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSessionStatus {
    pub session_id: String,
    pub document_id: String,
    pub upload_id: String,
    #[serde(alias = "s3Key")]
    pub storage_key: String,
    pub bucket: String,
    pub file_name: String,
    pub content_type: String,
    pub file_size: u64,
    #[serde(default)]
    pub part_size_bytes: Option<u64>,
    pub status: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Set once the session has been completed.
    #[serde(default)]
    pub attachment_id: Option<String>,
}
