//! Wire types for the transfer service HTTP boundary.
//!
//! Shapes mirror the service exactly: `POST /api/v1/upload`,
//! `GET /api/v1/download/info/{token}`, `GET /api/v1/download/{token}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a successful upload response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub download_url: String,
    pub download_token: String,
    pub expires_at: DateTime<Utc>,
    pub filename: String,
    pub file_size: u64,
    pub mime_type: String,
}

/// Body of `GET /api/v1/download/info/{token}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfoResponse {
    pub filename: String,
    pub file_size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_available: bool,
    pub antivirus_status: String,
}

/// Error bodies may carry a human-readable `detail` field.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<String>,
}

/// Extract the service-supplied `detail` from an error response, falling
/// back to the HTTP status when the body carries none.
pub async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(ErrorBody { detail: Some(detail) }) => detail,
        _ => format!("service returned {status}"),
    }
}
