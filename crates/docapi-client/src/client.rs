use std::path::Path;
use std::sync::Arc;

use docapi_core::{
    ApiError, DocumentInfo, DocumentUpdateRequest, LoginRequest, LoginResponse, RegisterRequest,
    UploadCompleteResponse, UploadResponse, UploadSessionStatus,
};
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::http::{seg, HttpTransport};
use crate::lock::LockClient;
use crate::upload::{FileSource, MultipartUploader, PartSource};

/// High-level client for the document management API.
///
/// Owns the credential store and the transport; locking and multipart
/// uploads are exposed both through dedicated sub-clients and as facade
/// methods. Intended control flow: authenticate, acquire a lock on the
/// target document, mutate or upload with the lock id, release the lock.
pub struct DocumentClient {
    transport: Arc<HttpTransport>,
    credentials: Arc<CredentialStore>,
    locks: LockClient,
    uploader: MultipartUploader,
}

fn tenant_query(tenant: Option<&str>) -> String {
    match tenant.filter(|t| !t.trim().is_empty()) {
        Some(t) => format!("?tenant={}", seg(t)),
        None => String::new(),
    }
}

impl DocumentClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let credentials = Arc::new(CredentialStore::new());
        let transport = Arc::new(HttpTransport::new(&config, credentials.clone())?);
        Ok(Self {
            locks: LockClient::new(transport.clone()),
            uploader: MultipartUploader::new(transport.clone(), config.default_part_size),
            transport,
            credentials,
        })
    }

    /// Per-tenant token state shared by every call this client makes.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Lease-lock operations.
    pub fn locks(&self) -> &LockClient {
        &self.locks
    }

    /// Multipart upload operations.
    pub fn uploads(&self) -> &MultipartUploader {
        &self.uploader
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Tenant governing an auth call: the explicit one when given,
    /// otherwise the default tenant remembered by the credential store.
    fn effective_tenant(&self, tenant: Option<&str>) -> Option<String> {
        tenant
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.credentials.default_tenant())
    }

    /// Log in, storing the returned token under `tenant` and making that
    /// tenant active. When no tenant is given, the remembered default
    /// tenant is used; tenant-less mode applies only when neither exists.
    #[instrument(skip(self, password), level = "debug")]
    pub async fn login(
        &self,
        tenant: Option<&str>,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, ApiError> {
        let tenant = self.effective_tenant(tenant);
        let path = format!("/api/auth/login{}", tenant_query(tenant.as_deref()));
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.transport.post_json(&path, Some(&body), None).await?;
        self.remember_token(tenant.as_deref(), &response.token);
        debug!("Logged in as {}", username);
        Ok(response)
    }

    /// Register a new user; a successful registration also authenticates.
    /// Tenant resolution matches [`DocumentClient::login`].
    #[instrument(skip(self, request), level = "debug")]
    pub async fn register(
        &self,
        tenant: Option<&str>,
        request: &RegisterRequest,
    ) -> Result<LoginResponse, ApiError> {
        let tenant = self.effective_tenant(tenant);
        let path = format!("/api/auth/register{}", tenant_query(tenant.as_deref()));
        let response: LoginResponse = self.transport.post_json(&path, Some(request), None).await?;
        self.remember_token(tenant.as_deref(), &response.token);
        Ok(response)
    }

    fn remember_token(&self, tenant: Option<&str>, token: &str) {
        match tenant.filter(|t| !t.trim().is_empty()) {
            Some(t) => {
                self.credentials.set_token(t, Some(token));
                self.credentials.set_active_tenant(t);
            }
            None => self.credentials.set_token("", Some(token)),
        }
    }

    // =========================================================================
    // Documents
    // =========================================================================

    /// Fetch a document, mapping a server 404 to `None`.
    #[instrument(skip(self), level = "debug")]
    pub async fn try_get_document(
        &self,
        document_id: &str,
    ) -> Result<Option<DocumentInfo>, ApiError> {
        let path = format!("/api/documents/{}", seg(document_id));
        match self.transport.get_json::<DocumentInfo>(&path).await {
            Ok(document) => Ok(Some(document)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn document_exists(&self, document_id: &str) -> Result<bool, ApiError> {
        Ok(self.try_get_document(document_id).await?.is_some())
    }

    /// Update a document; the server rejects the call without a valid lock
    /// when the document requires one.
    #[instrument(skip(self, request), level = "debug")]
    pub async fn update_document(
        &self,
        document_id: &str,
        request: &DocumentUpdateRequest,
        lock_id: Option<&str>,
    ) -> Result<DocumentInfo, ApiError> {
        let path = format!("/api/documents/{}", seg(document_id));
        self.transport
            .put_json(&path, request, lock_id)
            .await
            .map_err(|e| e.for_document(document_id))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn delete_document(
        &self,
        document_id: &str,
        lock_id: Option<&str>,
    ) -> Result<(), ApiError> {
        let path = format!("/api/documents/{}", seg(document_id));
        self.transport
            .delete(&path, lock_id)
            .await
            .map_err(|e| e.for_document(document_id))
    }

    // =========================================================================
    // Attachments
    // =========================================================================

    /// Single-shot attachment upload (multipart/form-data through the API
    /// server). Suitable for small files; large files should go through
    /// [`DocumentClient::upload_attachment_multipart`].
    #[instrument(skip(self), level = "debug")]
    pub async fn upload_attachment(
        &self,
        document_id: &str,
        path: &Path,
        lock_id: Option<&str>,
    ) -> Result<UploadResponse, ApiError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ApiError::Validation(format!("path {} has no usable file name", path.display()))
            })?
            .to_string();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Validation(format!("cannot read {}: {}", path.display(), e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(data).file_name(file_name));
        let api_path = format!("/api/documents/{}/attachments", seg(document_id));
        self.transport
            .post_form(&api_path, form, lock_id)
            .await
            .map_err(|e| e.for_document(document_id))
    }

    /// Chunked upload of an arbitrary [`PartSource`] via presigned URLs.
    pub async fn upload_attachment_multipart<S: PartSource + ?Sized>(
        &self,
        document_id: &str,
        source: &mut S,
        file_name: &str,
        content_type: &str,
        lock_id: Option<&str>,
    ) -> Result<UploadCompleteResponse, ApiError> {
        self.uploader
            .upload(document_id, source, file_name, content_type, lock_id)
            .await
    }

    /// Chunked upload of a file on disk; the file name is taken from the path.
    #[instrument(skip(self), level = "debug")]
    pub async fn upload_file_multipart(
        &self,
        document_id: &str,
        path: &Path,
        content_type: &str,
        lock_id: Option<&str>,
    ) -> Result<UploadCompleteResponse, ApiError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ApiError::Validation(format!("path {} has no usable file name", path.display()))
            })?
            .to_string();
        let mut source = FileSource::open(path).await?;
        self.uploader
            .upload(document_id, &mut source, &file_name, content_type, lock_id)
            .await
    }

    /// Server-side bookkeeping for an in-flight or finished upload session.
    pub async fn upload_status(
        &self,
        document_id: &str,
        session_id: &str,
    ) -> Result<UploadSessionStatus, ApiError> {
        self.uploader.status(document_id, session_id).await
    }
}
