//! The one permitted retrieval of a transfer's payload.

use crate::api;
use crate::errors::ConsumptionError;
use crate::transfer::{Token, TransferClient};
use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::StatusCode;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Payload bytes ready to be persisted, plus what the response declared
/// about them.
///
/// By the time a caller holds one of these, the token is already spent
/// server-side. Failing to persist the bytes cannot be recovered by a
/// retry; the bytes in this stream are the only copy the client will
/// ever see.
#[derive(Debug)]
pub struct PayloadStream {
    response: reqwest::Response,
}

impl PayloadStream {
    /// Content length as declared by the response, when present.
    pub fn declared_size(&self) -> Option<u64> {
        self.response.content_length()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Stream the payload into `path` and return the byte count written.
    pub async fn save_to(self, path: &Path) -> Result<u64> {
        let mut out = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Cannot create {}", path.display()))?;

        let mut stream = self.response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("payload stream interrupted")?;
            out.write_all(&chunk)
                .await
                .with_context(|| format!("Write failed for {}", path.display()))?;
            written += chunk.len() as u64;
        }
        out.flush()
            .await
            .with_context(|| format!("Flush failed for {}", path.display()))?;

        Ok(written)
    }

    /// Buffer the whole payload in memory.
    pub async fn bytes(self) -> Result<bytes::Bytes> {
        self.response
            .bytes()
            .await
            .context("payload stream interrupted")
    }
}

impl TransferClient {
    /// Perform the one permitted retrieval for `token`.
    ///
    /// Exactly one request, no internal retry. On success the session is
    /// permanently unavailable; callers must not attempt a second consume
    /// with the same token. A `Gone` here after a successful inspect is an
    /// expected race (another tab got there first, or the deadline passed
    /// between the two calls) and is handled as a normal terminal state.
    pub async fn consume(&self, token: &Token) -> Result<PayloadStream, ConsumptionError> {
        let response = self
            .http()
            .get(self.download_url(token))
            .send()
            .await
            .map_err(|e| ConsumptionError::Unknown(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::GONE {
            return Err(ConsumptionError::Gone(api::error_detail(response).await));
        }
        if !status.is_success() {
            return Err(ConsumptionError::Unknown(api::error_detail(response).await));
        }

        tracing::debug!(%token, "transfer consumed; link is now spent");

        Ok(PayloadStream { response })
    }
}
