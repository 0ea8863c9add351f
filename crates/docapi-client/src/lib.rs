//! Client for a remote document-management service.
//!
//! The interesting surface is the session and mutation-safety protocol:
//! - [`CredentialStore`]: multi-tenant bearer-token state
//! - [`LockClient`]: lease-based pessimistic locking guarding document
//!   mutations
//! - [`MultipartUploader`]: chunked uploads moving large files directly to
//!   backing storage via presigned URLs, coordinated with the lock and a
//!   server-tracked upload session
//!
//! Typical flow:
//! ```no_run
//! # async fn demo() -> Result<(), docapi_core::ApiError> {
//! use docapi_client::{ClientConfig, DocumentClient};
//!
//! let client = DocumentClient::new(ClientConfig::new("https://docs.example.com"))?;
//! client.login(Some("acme"), "alice", "secret").await?;
//!
//! let lock = client.locks().lock("doc-1", 60).await?;
//! client
//!     .upload_file_multipart("doc-1", "report.pdf".as_ref(), "application/pdf", Some(&lock.lock_id))
//!     .await?;
//! client.locks().release("doc-1", &lock.lock_id).await;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod credentials;
mod http;
mod lock;
mod upload;

pub use client::DocumentClient;
pub use config::{ClientConfig, DEFAULT_PART_SIZE};
pub use credentials::CredentialStore;
pub use http::{HttpTransport, LOCK_HEADER};
pub use lock::LockClient;
pub use upload::{BytesSource, FileSource, MultipartUploader, PartSource};

pub use docapi_core::{
    ApiError, CompletedPart, DocumentInfo, DocumentLock, DocumentUpdateRequest, LoginRequest,
    LoginResponse, PresignedPart, RegisterRequest, UploadCompleteRequest, UploadCompleteResponse,
    UploadInitRequest, UploadResponse, UploadSession, UploadSessionStatus,
};
