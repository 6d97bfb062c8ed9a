//! Identity provider trait and types.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::poll::{Poller, PollerConfig};
use crate::status::StatusResponse;

/// Known identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    BankId,
}

impl ProviderKind {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::BankId => "bankid",
        }
    }
}

/// Request to start an authentication.
#[derive(Debug, Clone)]
pub struct StartRequest {
    /// Whether the app runs on the same device as the browser.
    pub same_device: bool,
    /// Whether the browser is a mobile client.
    pub is_mobile: bool,
    /// IP address of the end user as seen by the relying party.
    pub user_ip: String,
    /// Free text appended to the message shown in the app.
    pub message_for_user: String,
}

/// Launch artifact of a started authentication.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_data: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Handle for status and cancel. Travels in a cookie, never in the body.
    #[serde(skip)]
    pub transaction_key: Option<String>,
}

impl StartResponse {
    pub fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
            ..Default::default()
        }
    }
}

/// Trait for identity providers.
///
/// BankID is the only implementation; the trait keeps the web layer independent of it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider kind.
    fn provider(&self) -> ProviderKind;

    /// Provider identifier used in routes and logs.
    fn name(&self) -> &'static str {
        self.provider().as_str()
    }

    /// Start an authentication.
    ///
    /// Vendor rejections come back as `Ok` with `success == false`; only transport
    /// errors are returned as `Err`.
    async fn start(&self, request: StartRequest) -> Result<StartResponse, Error>;

    /// Poll the authentication behind `key` once.
    async fn status(&self, key: &str) -> Result<StatusResponse, Error>;

    /// Abandon the authentication behind `key`. Unknown keys are ignored.
    async fn cancel(&self, key: &str);

    /// Poll the authentication behind `key` in the background until it is terminal.
    fn watch(self: Arc<Self>, key: &str, config: PollerConfig) -> Poller;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_name() {
        assert_eq!(ProviderKind::BankId.as_str(), "bankid");
    }

    #[test]
    fn test_start_response_hides_transaction_key() {
        let response = StartResponse {
            launch_url: Some("bankid:///?autostarttoken=abc&redirect=null".to_string()),
            success: true,
            transaction_key: Some("secret-key".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "launchUrl": "bankid:///?autostarttoken=abc&redirect=null",
                "success": true
            })
        );
    }

    #[test]
    fn test_failure_shape() {
        assert_eq!(
            serde_json::to_value(StartResponse::failure("Already in progress")).unwrap(),
            json!({ "success": false, "message": "Already in progress" })
        );
    }
}
