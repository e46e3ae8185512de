//! Client-side view of a transfer session and its observable lifecycle.

use crate::api::FileInfoResponse;
use crate::errors::{ConsumptionError, InspectionError};
use chrono::{DateTime, Utc};

/// Upstream content-safety verdict. Advisory only: it decorates display and
/// never gates transfer behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    Clean,
    /// Any non-clean verdict, carried verbatim.
    Other(String),
}

impl ScanStatus {
    pub fn is_clean(&self) -> bool {
        matches!(self, ScanStatus::Clean)
    }

    /// The raw verdict string as the service reported it.
    pub fn advisory(&self) -> &str {
        match self {
            ScanStatus::Clean => "clean",
            ScanStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for ScanStatus {
    fn from(raw: String) -> Self {
        if raw == "clean" {
            ScanStatus::Clean
        } else {
            ScanStatus::Other(raw)
        }
    }
}

/// Server-tracked record a token resolves to, as last observed by this
/// client. Never persisted locally; `is_available` only ever moves
/// true → false, and only the server decides when.
#[derive(Debug, Clone)]
pub struct TransferSession {
    pub filename: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_available: bool,
    pub scan_status: ScanStatus,
}

impl From<FileInfoResponse> for TransferSession {
    fn from(info: FileInfoResponse) -> Self {
        Self {
            filename: info.filename,
            size_bytes: info.file_size,
            mime_type: info.mime_type,
            uploaded_at: info.uploaded_at,
            expires_at: info.expires_at,
            is_available: info.is_available,
            scan_status: ScanStatus::from(info.antivirus_status),
        }
    }
}

/// Client-observed lifecycle of a single token.
///
/// `NotFound`, `Gone`, and `Consumed` are terminal and absorbing: once
/// entered, no further transition (and no further consume attempt) is
/// accepted. An `Unknown` failure leaves the state where it was, so the
/// caller may retry.
#[derive(Debug, Clone)]
pub enum TokenState {
    Uninspected,
    Available(TransferSession),
    NotFound,
    Gone(String),
    Consumed,
}

impl TokenState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TokenState::NotFound | TokenState::Gone(_) | TokenState::Consumed
        )
    }

    /// Whether a consume attempt is legal from this state.
    pub fn can_consume(&self) -> bool {
        matches!(self, TokenState::Available(session) if session.is_available)
    }

    /// Fold an inspection outcome into the machine.
    pub fn apply_inspect(self, outcome: &Result<TransferSession, InspectionError>) -> Self {
        if self.is_terminal() {
            return self;
        }
        match outcome {
            Ok(session) => TokenState::Available(session.clone()),
            Err(InspectionError::NotFound) => TokenState::NotFound,
            Err(InspectionError::Gone(reason)) => TokenState::Gone(reason.clone()),
            Err(InspectionError::Unknown(_)) => self,
        }
    }

    /// Fold a consumption outcome into the machine.
    pub fn apply_consume<T>(self, outcome: &Result<T, ConsumptionError>) -> Self {
        if self.is_terminal() {
            return self;
        }
        match outcome {
            Ok(_) => TokenState::Consumed,
            Err(ConsumptionError::Gone(reason)) => TokenState::Gone(reason.clone()),
            // Transport hiccup: token may still be live, caller decides
            Err(ConsumptionError::Unknown(_)) => self,
        }
    }
}
