use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use docapi_core::{
    ApiError, CompletedPart, PresignedPart, UploadCompleteRequest, UploadCompleteResponse,
    UploadInitRequest, UploadSession, UploadSessionStatus,
};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, instrument, warn};

use crate::http::{seg, HttpTransport};

/// Source of upload bytes, read one part-sized range at a time.
///
/// Constructed once per upload; the orchestrator asks for exactly one
/// in-flight range, so implementations only ever buffer a single part.
#[async_trait]
pub trait PartSource: Send {
    /// Total number of bytes the source will provide.
    fn total_size(&self) -> u64;

    /// Read exactly `len` bytes starting at `offset`.
    async fn read_range(&mut self, offset: u64, len: u64) -> Result<Vec<u8>, ApiError>;
}

/// [`PartSource`] over a file on disk.
pub struct FileSource {
    file: tokio::fs::File,
    size: u64,
}

impl FileSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ApiError::Validation(format!("cannot open {}: {}", path.display(), e)))?;
        let size = file
            .metadata()
            .await
            .map_err(|e| ApiError::Validation(format!("cannot stat {}: {}", path.display(), e)))?
            .len();
        Ok(Self { file, size })
    }
}

#[async_trait]
impl PartSource for FileSource {
    fn total_size(&self) -> u64 {
        self.size
    }

    async fn read_range(&mut self, offset: u64, len: u64) -> Result<Vec<u8>, ApiError> {
        self.file
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| ApiError::Validation(format!("seek to {} failed: {}", offset, e)))?;
        let mut buffer = vec![0u8; len as usize];
        self.file
            .read_exact(&mut buffer)
            .await
            .map_err(|e| ApiError::Validation(format!("short read at offset {}: {}", offset, e)))?;
        Ok(buffer)
    }
}

/// [`PartSource`] over an in-memory buffer.
pub struct BytesSource {
    data: Vec<u8>,
}

impl BytesSource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl PartSource for BytesSource {
    fn total_size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_range(&mut self, offset: u64, len: u64) -> Result<Vec<u8>, ApiError> {
        let start = offset as usize;
        let end = start
            .checked_add(len as usize)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                ApiError::Validation(format!("range {}+{} is out of bounds", offset, len))
            })?;
        Ok(self.data[start..end].to_vec())
    }
}

fn part_count(file_size: u64, part_size: u64) -> u64 {
    file_size.div_ceil(part_size)
}

/// Byte range of a 1-based part: the final part carries the remainder.
fn part_range(part_number: u32, part_size: u64, file_size: u64) -> (u64, u64) {
    let offset = u64::from(part_number - 1) * part_size;
    let len = part_size.min(file_size - offset);
    (offset, len)
}

/// Drives the chunked multipart upload protocol:
/// initiate session, then per part (strictly sequential, ascending
/// 1-based numbers) presign + direct PUT to storage, then complete with
/// the accumulated part digests.
///
/// Any failure after a session id exists triggers a best-effort abort so
/// the server can release reserved storage, then the original error is
/// propagated. Sessions are never resumed: a failed upload restarts the
/// protocol from initiate.
pub struct MultipartUploader {
    transport: Arc<HttpTransport>,
    fallback_part_size: u64,
}

impl MultipartUploader {
    pub fn new(transport: Arc<HttpTransport>, fallback_part_size: u64) -> Self {
        Self {
            transport,
            fallback_part_size,
        }
    }

    /// Upload `source` as an attachment of `document_id`.
    ///
    /// `lock_id` is the governing lease lock, attached to every session
    /// call (the direct storage PUTs are presigned and carry neither the
    /// bearer token nor the lock header).
    #[instrument(skip(self, source), level = "debug", fields(size = source.total_size()))]
    pub async fn upload<S: PartSource + ?Sized>(
        &self,
        document_id: &str,
        source: &mut S,
        file_name: &str,
        content_type: &str,
        lock_id: Option<&str>,
    ) -> Result<UploadCompleteResponse, ApiError> {
        let file_size = source.total_size();
        if file_size == 0 {
            return Err(ApiError::Validation(format!(
                "refusing to upload empty file {}",
                file_name
            )));
        }

        let init = UploadInitRequest {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            file_size,
            part_size_bytes: None,
        };
        let path = format!("/api/documents/{}/attachments/multipart", seg(document_id));
        let session: UploadSession = self
            .transport
            .post_json(&path, Some(&init), lock_id)
            .await
            .map_err(|e| e.for_document(document_id))?;
        debug!(
            "Initiated upload session {} for document {}",
            session.session_id, document_id
        );

        match self
            .drive(document_id, &session, source, file_size, lock_id)
            .await
        {
            Ok(done) => Ok(done),
            Err(err) => {
                self.abort(document_id, &session.session_id, lock_id).await;
                Err(err)
            }
        }
    }

    /// Part loop and completion. The caller aborts the session on error.
    async fn drive<S: PartSource + ?Sized>(
        &self,
        document_id: &str,
        session: &UploadSession,
        source: &mut S,
        file_size: u64,
        lock_id: Option<&str>,
    ) -> Result<UploadCompleteResponse, ApiError> {
        // The server's choice of part size wins over the local fallback.
        let part_size = session
            .part_size_bytes
            .filter(|&n| n > 0)
            .unwrap_or(self.fallback_part_size);
        if part_size == 0 {
            return Err(ApiError::Validation(
                "part size must be positive".to_string(),
            ));
        }

        let total_parts = part_count(file_size, part_size);
        if total_parts == 0 || total_parts > u64::from(u32::MAX) {
            return Err(ApiError::Validation(format!(
                "invalid part count {} for session {}",
                total_parts, session.session_id
            )));
        }
        let total_parts = total_parts as u32;
        debug!(
            "Uploading {} bytes as {} parts of up to {} bytes",
            file_size, total_parts, part_size
        );

        let mut completed = Vec::with_capacity(total_parts as usize);
        for part_number in 1..=total_parts {
            let (offset, len) = part_range(part_number, part_size, file_size);
            let bytes = source.read_range(offset, len).await?;

            let presign_path = format!(
                "/api/documents/{}/attachments/multipart/{}/presign-part?partNumber={}",
                seg(document_id),
                seg(&session.session_id),
                part_number
            );
            let presigned: PresignedPart = self
                .transport
                .post_json::<(), _>(&presign_path, None, lock_id)
                .await
                .map_err(|e| e.for_document(document_id))?;

            // A 2xx PUT without a digest cannot be completed; treat it as a
            // protocol violation rather than retrying.
            let e_tag = self
                .transport
                .put_part(&presigned.presigned_url, bytes)
                .await?
                .ok_or_else(|| {
                    ApiError::Validation(format!(
                        "storage returned no content digest for part {} of session {}",
                        part_number, session.session_id
                    ))
                })?;
            debug!(
                "Uploaded part {}/{} ({} bytes) of session {}",
                part_number, total_parts, len, session.session_id
            );
            completed.push(CompletedPart { part_number, e_tag });
        }

        let complete_path = format!(
            "/api/documents/{}/attachments/multipart/{}/complete",
            seg(document_id),
            seg(&session.session_id)
        );
        let body = UploadCompleteRequest { parts: completed };
        let response: UploadCompleteResponse = self
            .transport
            .post_json(&complete_path, Some(&body), lock_id)
            .await
            .map_err(|e| e.for_document(document_id))?;
        debug!(
            "Completed upload session {}, attachment {}",
            response.session_id, response.attachment_id
        );
        Ok(response)
    }

    /// Best-effort session abort; its own failure is logged, never escalated.
    async fn abort(&self, document_id: &str, session_id: &str, lock_id: Option<&str>) {
        let path = format!(
            "/api/documents/{}/attachments/multipart/{}/abort",
            seg(document_id),
            seg(session_id)
        );
        match self
            .transport
            .post_no_content::<()>(&path, None, lock_id)
            .await
        {
            Ok(()) => debug!("Aborted upload session {}", session_id),
            Err(e) => warn!(
                "Failed to abort upload session {} for document {}: {}",
                session_id, document_id, e
            ),
        }
    }

    /// Server-side bookkeeping for an upload session. Read-only, no lock.
    #[instrument(skip(self), level = "debug")]
    pub async fn status(
        &self,
        document_id: &str,
        session_id: &str,
    ) -> Result<UploadSessionStatus, ApiError> {
        let path = format!(
            "/api/documents/{}/attachments/multipart/{}",
            seg(document_id),
            seg(session_id)
        );
        self.transport
            .get_json(&path)
            .await
            .map_err(|e| e.for_document(document_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(25_000_000, 10_000_000, 3)]
    #[case(10_000_000, 10_000_000, 1)]
    #[case(10_000_001, 10_000_000, 2)]
    #[case(1, 10_000_000, 1)]
    #[case(0, 10_000_000, 0)]
    fn part_count_is_ceiling_division(
        #[case] file_size: u64,
        #[case] part_size: u64,
        #[case] expected: u64,
    ) {
        assert_eq!(part_count(file_size, part_size), expected);
    }

    #[test]
    fn final_part_carries_the_remainder() {
        let file_size = 25_000_000;
        let part_size = 10_000_000;
        assert_eq!(part_range(1, part_size, file_size), (0, 10_000_000));
        assert_eq!(part_range(2, part_size, file_size), (10_000_000, 10_000_000));
        assert_eq!(part_range(3, part_size, file_size), (20_000_000, 5_000_000));
    }

    #[rstest]
    #[case(25_000_000, 10_000_000)]
    #[case(7, 3)]
    #[case(1024, 1024)]
    #[case(1025, 1024)]
    fn part_lengths_sum_to_file_size(#[case] file_size: u64, #[case] part_size: u64) {
        let total = part_count(file_size, part_size) as u32;
        let mut sum = 0;
        for part_number in 1..=total {
            let (offset, len) = part_range(part_number, part_size, file_size);
            assert_eq!(offset, u64::from(part_number - 1) * part_size);
            // Only the final part may be short.
            if part_number < total {
                assert_eq!(len, part_size);
            }
            sum += len;
        }
        assert_eq!(sum, file_size);
    }

    #[tokio::test]
    async fn bytes_source_reads_exact_ranges() {
        let mut source = BytesSource::new((0u8..100).collect());
        assert_eq!(source.total_size(), 100);
        assert_eq!(source.read_range(0, 10).await.unwrap(), (0u8..10).collect::<Vec<_>>());
        assert_eq!(source.read_range(90, 10).await.unwrap(), (90u8..100).collect::<Vec<_>>());
        assert!(source.read_range(95, 10).await.is_err());
    }
}
