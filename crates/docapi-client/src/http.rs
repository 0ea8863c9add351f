use std::sync::Arc;

use docapi_core::ApiError;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::credentials::CredentialStore;

/// Header carrying the lease-lock id on mutating document calls.
pub const LOCK_HEADER: &str = "X-Document-Lock-Id";

/// Percent-encode a path segment.
pub(crate) fn seg(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// JSON-over-HTTP transport for the document API.
///
/// Every call resolves its bearer token from the credential store at send
/// time and attaches the lock header only when a lock id is supplied.
/// Non-2xx responses are mapped to the [`ApiError`] taxonomy from the
/// server's `{code, message}` error body, with status-code fallbacks.
pub struct HttpTransport {
    client: HttpClient,
    base_url: String,
    credentials: Arc<CredentialStore>,
}

/// Error body shape returned by the API server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig, credentials: Arc<CredentialStore>) -> Result<Self, ApiError> {
        let client = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        lock_id: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = self.credentials.resolve_token() {
            request = request.bearer_auth(token);
        }
        if let Some(lock_id) = lock_id {
            request = request.header(LOCK_HEADER, lock_id);
        }
        request
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("request failed: {}", e)))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    /// GET a typed JSON response.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let response = self.send(self.request(reqwest::Method::GET, path, None)).await?;
        Self::decode(response).await
    }

    /// POST an optional JSON body, expecting a typed JSON response.
    #[instrument(skip(self, body), level = "debug")]
    pub async fn post_json<B, R>(
        &self,
        path: &str,
        body: Option<&B>,
        lock_id: Option<&str>,
    ) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let mut request = self.request(reqwest::Method::POST, path, lock_id);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// POST an optional JSON body, discarding any response body.
    #[instrument(skip(self, body), level = "debug")]
    pub async fn post_no_content<B>(
        &self,
        path: &str,
        body: Option<&B>,
        lock_id: Option<&str>,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let mut request = self.request(reqwest::Method::POST, path, lock_id);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request).await?;
        Ok(())
    }

    /// PUT a typed JSON body, expecting a typed JSON response.
    #[instrument(skip(self, body), level = "debug")]
    pub async fn put_json<B, R>(
        &self,
        path: &str,
        body: &B,
        lock_id: Option<&str>,
    ) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let request = self.request(reqwest::Method::PUT, path, lock_id).json(body);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// DELETE, discarding any response body.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete(&self, path: &str, lock_id: Option<&str>) -> Result<(), ApiError> {
        self.send(self.request(reqwest::Method::DELETE, path, lock_id))
            .await?;
        Ok(())
    }

    /// POST a multipart/form-data body, expecting a typed JSON response.
    #[instrument(skip(self, form), level = "debug")]
    pub async fn post_form<R: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        lock_id: Option<&str>,
    ) -> Result<R, ApiError> {
        let request = self
            .request(reqwest::Method::POST, path, lock_id)
            .multipart(form);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// Raw PUT of one part's bytes to a presigned storage URL.
    ///
    /// Presigned URLs are pre-authorized, so no bearer token is attached.
    /// Returns the storage-returned content digest (ETag header, matched
    /// case-insensitively) when present; the caller decides whether its
    /// absence is fatal.
    #[instrument(skip(self, bytes), level = "debug", fields(len = bytes.len()))]
    pub async fn put_part(&self, url: &str, bytes: Vec<u8>) -> Result<Option<String>, ApiError> {
        let response = self
            .client
            .put(url)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("part PUT failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Transport(format!(
                "storage PUT returned {}: {}",
                status, text
            )));
        }

        let e_tag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        debug!("Part stored, digest present: {}", e_tag.is_some());
        Ok(e_tag)
    }

    async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ApiError> {
        response
            .json::<R>()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to decode response body: {}", e)))
    }

    /// Map a non-2xx response to the error taxonomy.
    ///
    /// The server's `code` field wins over the status code; lock and
    /// conflict variants come back with an empty document id that call
    /// sites fill via [`ApiError::for_document`].
    async fn error_from_response(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        let body: Option<ErrorBody> = serde_json::from_str(&text).ok();
        let message = body
            .as_ref()
            .and_then(|b| b.message.clone().or_else(|| b.error.clone()))
            .unwrap_or_else(|| text.clone());

        if let Some(code) = body.as_ref().and_then(|b| b.code.as_deref()) {
            match code {
                "LOCK_REQUIRED" => {
                    return ApiError::LockRequired {
                        document_id: String::new(),
                    }
                }
                "LOCK_MISMATCH" => {
                    return ApiError::LockMismatch {
                        document_id: String::new(),
                    }
                }
                "LOCK_EXPIRED" | "EXPIRED_LOCK" => {
                    return ApiError::ExpiredLock {
                        document_id: String::new(),
                    }
                }
                "DOCUMENT_LOCKED" | "CONFLICT" => {
                    return ApiError::Conflict {
                        document_id: String::new(),
                    }
                }
                "NOT_FOUND" => return ApiError::NotFound(message),
                "UNAUTHORIZED" | "FORBIDDEN" | "INVALID_CREDENTIALS" => {
                    return ApiError::Auth(message)
                }
                _ => {}
            }
        }

        match status.as_u16() {
            401 | 403 => ApiError::Auth(message),
            404 => ApiError::NotFound(message),
            409 | 423 => ApiError::Conflict {
                document_id: String::new(),
            },
            s => ApiError::Api { status: s, message },
        }
    }
}
