//! Status engine: interprets one collect result for a transaction.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::details::UserDetailType;
use crate::rp::{CollectResponse, CollectStatus, CompletionData};
use crate::transaction::Transaction;

pub const TRANSACTION_NOT_FOUND: &str = "Transaction not found";
pub const TRANSACTION_EXPIRED: &str = "Transaction expired";
pub const TRANSACTION_NOT_STARTED: &str = "Transaction not started";
pub const SAME_DEVICE_MISMATCH: &str = "BankID transaction was not completed using the same device";
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";
pub const SUCCESS: &str = "Success!";

/// Simplified order status exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Complete,
    Failed,
}

/// Extra payload of a status response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusData {
    /// Current QR frame of a pending cross-device order.
    Qr {
        #[serde(rename = "qrData")]
        qr_data: String,
    },
    /// Verified identity of a completed order.
    Completion(CompletionData),
}

/// Result of one status request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StatusData>,
    /// Requested user details of a completed order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<UserDetailType, String>>,
}

impl StatusResponse {
    pub fn failed(message: &str) -> Self {
        Self {
            message: message.to_string(),
            status: Status::Failed,
            data: None,
            details: None,
        }
    }

    pub fn not_found() -> Self {
        Self::failed(TRANSACTION_NOT_FOUND)
    }

    /// Complete and failed are final; pending asks the caller to poll again.
    pub fn is_terminal(&self) -> bool {
        self.status != Status::Pending
    }

    pub fn qr_data(&self) -> Option<&str> {
        match &self.data {
            Some(StatusData::Qr { qr_data }) => Some(qr_data),
            _ => None,
        }
    }

    pub fn completion_data(&self) -> Option<&CompletionData> {
        match &self.data {
            Some(StatusData::Completion(data)) => Some(data),
            _ => None,
        }
    }
}

/// Turn one collect result into a status for `transaction` as seen at `now`.
pub fn resolve(
    transaction: &Transaction,
    collected: CollectResponse,
    now: Instant,
    session_timeout: Duration,
) -> StatusResponse {
    match collected.status {
        CollectStatus::Failed => StatusResponse::failed(collected.hint_code.message()),
        CollectStatus::Pending => StatusResponse {
            message: collected.hint_code.message().to_string(),
            status: Status::Pending,
            data: transaction
                .qr_frame(now, session_timeout)
                .map(|frame| StatusData::Qr {
                    qr_data: frame.to_string(),
                }),
            details: None,
        },
        CollectStatus::Complete => {
            // A complete order always carries the verified identity.
            let Some(data) = collected.completion_data else {
                return StatusResponse::failed(AUTHENTICATION_FAILED);
            };
            // A same-device order must finish on the device that started it.
            if transaction.same_device && transaction.origin_ip != data.device.ip_address {
                return StatusResponse::failed(SAME_DEVICE_MISMATCH);
            }
            StatusResponse {
                message: SUCCESS.to_string(),
                status: Status::Complete,
                data: Some(StatusData::Completion(data)),
                details: None,
            }
        }
        CollectStatus::Unknown => StatusResponse::failed(AUTHENTICATION_FAILED),
    }
}
