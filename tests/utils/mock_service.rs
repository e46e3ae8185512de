//! In-memory stand-in for the transfer service.
//!
//! Mirrors the real wire contract: multipart upload, info probe, and a
//! one-time download whose winner is decided by an atomic swap.

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

pub struct StoredFile {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub antivirus_status: String,
    downloaded: AtomicBool,
    expired: AtomicBool,
}

impl StoredFile {
    fn is_available(&self) -> bool {
        !self.downloaded.load(Ordering::SeqCst) && !self.expired.load(Ordering::SeqCst)
    }

    fn gone_reason(&self, for_download: bool) -> String {
        if self.expired.load(Ordering::SeqCst) {
            "File has expired".to_string()
        } else if for_download {
            "File has already been downloaded (one-time use)".to_string()
        } else {
            "File has already been downloaded".to_string()
        }
    }
}

#[derive(Clone, Default)]
pub struct MockService {
    files: Arc<DashMap<String, Arc<StoredFile>>>,
    reject_uploads: Arc<RwLock<Option<String>>>,
    upload_hits: Arc<AtomicUsize>,
    info_hits: Arc<AtomicUsize>,
    download_hits: Arc<AtomicUsize>,
}

impl MockService {
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/v1/upload", post(upload))
            .route("/api/v1/download/info/:token", get(info))
            .route("/api/v1/download/:token", get(download))
            .layer(DefaultBodyLimit::max(256 * 1024 * 1024))
            .with_state(self.clone())
    }

    /// Serve on an ephemeral port and return the base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock service");
        let addr = listener.local_addr().expect("local addr");
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock service");
        });
        format!("http://{addr}")
    }

    /// Insert a stored file directly, skipping the upload endpoint.
    pub fn seed(&self, filename: &str, content: &[u8]) -> String {
        self.seed_with_status(filename, content, "clean")
    }

    pub fn seed_with_status(&self, filename: &str, content: &[u8], antivirus_status: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        self.files.insert(
            token.clone(),
            Arc::new(StoredFile {
                filename: filename.to_string(),
                mime_type: "application/octet-stream".to_string(),
                content: content.to_vec(),
                uploaded_at: now,
                expires_at: now + Duration::hours(24),
                antivirus_status: antivirus_status.to_string(),
                downloaded: AtomicBool::new(false),
                expired: AtomicBool::new(false),
            }),
        );
        token
    }

    /// Force a stored file past its deadline.
    pub fn expire(&self, token: &str) {
        if let Some(file) = self.files.get(token) {
            file.expired.store(true, Ordering::SeqCst);
        }
    }

    /// Make the upload endpoint reject every submission with this detail.
    pub fn reject_uploads(&self, detail: &str) {
        *self.reject_uploads.write().expect("reject lock") = Some(detail.to_string());
    }

    pub fn upload_hits(&self) -> usize {
        self.upload_hits.load(Ordering::SeqCst)
    }

    pub fn info_hits(&self) -> usize {
        self.info_hits.load(Ordering::SeqCst)
    }

    pub fn download_hits(&self) -> usize {
        self.download_hits.load(Ordering::SeqCst)
    }
}

#[derive(serde::Deserialize)]
struct UploadParams {
    ttl_hours: Option<i64>,
}

async fn upload(
    State(service): State<MockService>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Response {
    service.upload_hits.fetch_add(1, Ordering::SeqCst);

    if let Some(detail) = service.reject_uploads.read().expect("reject lock").clone() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": detail })),
        )
            .into_response();
    }

    let mut stored: Option<(String, String, Vec<u8>)> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.bin").to_string();
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            match field.bytes().await {
                Ok(bytes) => stored = Some((filename, mime_type, bytes.to_vec())),
                Err(_) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "detail": "Unreadable multipart body" })),
                    )
                        .into_response()
                }
            }
        }
    }

    let Some((filename, mime_type, content)) = stored else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Missing file field" })),
        )
            .into_response();
    };

    let now = Utc::now();
    let expires_at = now + Duration::hours(params.ttl_hours.unwrap_or(24));
    let token = Uuid::new_v4().simple().to_string();
    let file_size = content.len() as u64;

    service.files.insert(
        token.clone(),
        Arc::new(StoredFile {
            filename: filename.clone(),
            mime_type: mime_type.clone(),
            content,
            uploaded_at: now,
            expires_at,
            antivirus_status: "clean".to_string(),
            downloaded: AtomicBool::new(false),
            expired: AtomicBool::new(false),
        }),
    );

    (
        StatusCode::CREATED,
        Json(json!({
            "file_id": Uuid::new_v4().to_string(),
            "download_url": format!("http://mock.invalid/api/v1/download/{token}"),
            "download_token": token,
            "expires_at": expires_at,
            "filename": filename,
            "file_size": file_size,
            "mime_type": mime_type,
        })),
    )
        .into_response()
}

async fn info(State(service): State<MockService>, Path(token): Path<String>) -> Response {
    service.info_hits.fetch_add(1, Ordering::SeqCst);

    let Some(file) = service.files.get(&token) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "File not found" })),
        )
            .into_response();
    };

    if !file.is_available() {
        return (
            StatusCode::GONE,
            Json(json!({ "detail": file.gone_reason(false) })),
        )
            .into_response();
    }

    Json(json!({
        "filename": file.filename,
        "file_size": file.content.len() as u64,
        "mime_type": file.mime_type,
        "uploaded_at": file.uploaded_at,
        "expires_at": file.expires_at,
        "is_available": true,
        "antivirus_status": file.antivirus_status,
    }))
    .into_response()
}

async fn download(State(service): State<MockService>, Path(token): Path<String>) -> Response {
    service.download_hits.fetch_add(1, Ordering::SeqCst);

    let Some(file) = service.files.get(&token) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "File not found" })),
        )
            .into_response();
    };

    if file.expired.load(Ordering::SeqCst) {
        return (
            StatusCode::GONE,
            Json(json!({ "detail": "File has expired" })),
        )
            .into_response();
    }

    // Atomic claim: under concurrent downloads exactly one caller wins
    if file.downloaded.swap(true, Ordering::SeqCst) {
        return (
            StatusCode::GONE,
            Json(json!({ "detail": file.gone_reason(true) })),
        )
            .into_response();
    }

    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        file.content.clone(),
    )
        .into_response()
}
