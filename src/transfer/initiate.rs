//! Submitting a local file and minting a single-use share link.

use crate::api::{self, UploadResponse};
use crate::common::progress::{ProgressSender, ProgressTracker};
use crate::config::{MAX_UPLOAD_SIZE_BYTES, UPLOAD_CHUNK_BYTES};
use crate::errors::InitiationError;
use crate::transfer::{Token, TransferClient};
use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::multipart;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

/// File selected for upload, with the metadata the service wants up front.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub path: PathBuf,
    pub filename: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl LocalFile {
    /// Stat `path` and sniff a media type from its leading magic bytes.
    pub async fn open(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?;
        ensure!(
            metadata.is_file(),
            "{} is not a regular file",
            path.display()
        );

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("{} has no usable file name", path.display()))?
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            filename,
            size_bytes: metadata.len(),
            mime_type: sniff_mime(path).await,
        })
    }
}

/// Best-effort content sniffing; unknown content ships as octet-stream.
async fn sniff_mime(path: &Path) -> String {
    let mut head = [0u8; 512];
    let read = match tokio::fs::File::open(path).await {
        Ok(mut file) => file.read(&mut head).await.unwrap_or(0),
        Err(_) => 0,
    };
    infer::get(&head[..read])
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Shareable result of a successful initiation. The link is constructed by
/// the service, never derived locally.
#[derive(Debug, Clone)]
pub struct TransferDescriptor {
    pub token: Token,
    pub shareable_link: String,
    pub expires_at: DateTime<Utc>,
    pub filename: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl TransferClient {
    /// Submit `file` as a single multipart upload.
    ///
    /// The size cap is the one precondition enforced client-side; it fails
    /// before any network I/O. The body streams from disk, so no copy of
    /// the file outlives the call. Progress percentages land on `progress`
    /// while bytes move; the sequence ends at 100 only when the service has
    /// accepted the upload.
    pub async fn initiate(
        &self,
        file: &LocalFile,
        ttl_hours: Option<u32>,
        progress: Option<ProgressSender>,
    ) -> Result<TransferDescriptor, InitiationError> {
        if file.size_bytes > MAX_UPLOAD_SIZE_BYTES {
            return Err(InitiationError::TooLarge {
                size_bytes: file.size_bytes,
                limit_bytes: MAX_UPLOAD_SIZE_BYTES,
            });
        }

        let handle = tokio::fs::File::open(&file.path).await.map_err(|e| {
            InitiationError::SubmissionFailed(format!("cannot open {}: {e}", file.path.display()))
        })?;

        let tracker = Arc::new(Mutex::new(ProgressTracker::new(file.size_bytes, progress)));
        tracker.lock().expect("progress lock").start();

        let stream_tracker = Arc::clone(&tracker);
        let body_stream = ReaderStream::with_capacity(handle, UPLOAD_CHUNK_BYTES).inspect(
            move |chunk| {
                if let Ok(chunk) = chunk {
                    stream_tracker
                        .lock()
                        .expect("progress lock")
                        .advance(chunk.len() as u64);
                }
            },
        );

        let part = multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(body_stream),
            file.size_bytes,
        )
        .file_name(file.filename.clone())
        .mime_str(&file.mime_type)
        .map_err(|e| InitiationError::SubmissionFailed(format!("invalid media type: {e}")))?;

        let mut request = self
            .http()
            .post(self.upload_url())
            .multipart(multipart::Form::new().part("file", part));
        if let Some(ttl) = ttl_hours {
            request = request.query(&[("ttl_hours", ttl)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| InitiationError::SubmissionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(InitiationError::SubmissionFailed(
                api::error_detail(response).await,
            ));
        }

        let payload: UploadResponse = response.json().await.map_err(|e| {
            InitiationError::SubmissionFailed(format!("malformed upload response: {e}"))
        })?;

        tracker.lock().expect("progress lock").finish();

        tracing::debug!(filename = %payload.filename, "upload accepted");

        Ok(TransferDescriptor {
            token: Token::from(payload.download_token),
            shareable_link: payload.download_url,
            expires_at: payload.expires_at,
            filename: payload.filename,
            size_bytes: payload.file_size,
            mime_type: payload.mime_type,
        })
    }
}
