//! Probing transfer metadata without spending the link.

use crate::api::{self, FileInfoResponse};
use crate::errors::InspectionError;
use crate::transfer::{Token, TransferClient, TransferSession};
use reqwest::StatusCode;

impl TransferClient {
    /// Fetch session metadata for `token`.
    ///
    /// Pure read: the service does not count this against the one-time use,
    /// and availability observed here can still change before a consume.
    /// 404 and 410 map to distinct errors and must stay distinct for
    /// display.
    pub async fn inspect(&self, token: &Token) -> Result<TransferSession, InspectionError> {
        let response = self
            .http()
            .get(self.info_url(token))
            .send()
            .await
            .map_err(|e| InspectionError::Unknown(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(InspectionError::NotFound);
        }
        if status == StatusCode::GONE {
            return Err(InspectionError::Gone(api::error_detail(response).await));
        }
        if !status.is_success() {
            return Err(InspectionError::Unknown(api::error_detail(response).await));
        }

        let info: FileInfoResponse = response
            .json()
            .await
            .map_err(|e| InspectionError::Unknown(format!("malformed info response: {e}")))?;

        Ok(TransferSession::from(info))
    }
}
