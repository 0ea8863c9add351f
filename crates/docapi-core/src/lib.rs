//! Shared types for the document-management API client.
//!
//! This crate defines the wire DTOs and the error taxonomy used across the
//! client:
//! - Auth: login/register requests and the token response
//! - Locking: lease-lock request and the `DocumentLock` handle
//! - Multipart upload: session, presigned part, completed part, status
//! - `ApiError`: typed failures callers can branch on

mod auth;
mod document;
mod error;
mod lock;
mod upload;

pub use auth::{LoginRequest, LoginResponse, RegisterRequest};
pub use document::{DocumentInfo, DocumentUpdateRequest, UploadResponse};
pub use error::ApiError;
pub use lock::{DocumentLock, LockRequest};
pub use upload::{
    CompletedPart, PresignedPart, UploadCompleteRequest, UploadCompleteResponse, UploadInitRequest,
    UploadSession, UploadSessionStatus,
};
