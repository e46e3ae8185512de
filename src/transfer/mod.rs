//! Client-side transfer lifecycle: initiate, inspect, consume.
//!
//! The service is the sole arbiter of availability. Every operation here
//! re-derives state from the latest response rather than from local history,
//! since another client can spend the same token at any moment.

pub mod consume;
pub mod initiate;
pub mod inspect;
pub mod session;

pub use consume::PayloadStream;
pub use initiate::{LocalFile, TransferDescriptor};
pub use session::{ScanStatus, TokenState, TransferSession};

use anyhow::{ensure, Context, Result};
use std::fmt;
use std::time::Duration;

/// Opaque single-use credential identifying one transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Accepts either a bare token or a full share link. For links the
    /// token is the last non-empty path segment.
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        ensure!(!raw.is_empty(), "empty token");

        if let Ok(url) = reqwest::Url::parse(raw) {
            if matches!(url.scheme(), "http" | "https") {
                let segment = url
                    .path_segments()
                    .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                    .map(str::to_string)
                    .context("share link has no token segment")?;
                return Ok(Self(segment));
            }
        }

        ensure!(
            !raw.contains('/') && !raw.contains(char::is_whitespace),
            "not a valid token or share link: {raw}"
        );
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// HTTP client bound to one transfer service endpoint.
///
/// Cheap to clone; all three lifecycle operations go through it. Each call
/// issues exactly one request and suspends until it settles, so no parallel
/// in-flight calls for the same token originate here.
#[derive(Debug, Clone)]
pub struct TransferClient {
    http: reqwest::Client,
    base_url: String,
}

impl TransferClient {
    /// `base_url` should already be validated; a zero timeout keeps the
    /// transport default.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn upload_url(&self) -> String {
        format!("{}/api/v1/upload", self.base_url)
    }

    pub(crate) fn info_url(&self, token: &Token) -> String {
        format!("{}/api/v1/download/info/{}", self.base_url, token)
    }

    pub(crate) fn download_url(&self, token: &Token) -> String {
        format!("{}/api/v1/download/{}", self.base_url, token)
    }
}
