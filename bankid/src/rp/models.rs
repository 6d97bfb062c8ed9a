//! Request and response payloads of the RP API.
//!
//! Field names follow the vendor's camelCase wire format.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::hint::HintCode;

/// Format of `userVisibleData` sent with every order.
pub const USER_VISIBLE_DATA_FORMAT: &str = "simpleMarkdownV1";

/// Body of `POST /auth`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub end_user_ip: String,
    /// Base64 encoded text shown to the user in the app.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_visible_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_visible_data_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_non_visible_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement: Option<Requirement>,
}

impl AuthRequest {
    /// Order for `end_user_ip` restricted to a single certificate policy.
    pub fn new(end_user_ip: &str, user_visible_data: Option<String>, policy_oid: &str) -> Self {
        let user_visible_data_format = user_visible_data
            .as_ref()
            .map(|_| USER_VISIBLE_DATA_FORMAT.to_string());
        Self {
            end_user_ip: end_user_ip.to_string(),
            user_visible_data,
            user_visible_data_format,
            user_non_visible_data: None,
            requirement: Some(Requirement {
                certificate_policies: vec![policy_oid.to_string()],
                ..Default::default()
            }),
        }
    }
}

/// Card reader class requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardReaderClass {
    /// Computer or reader (default).
    Class1,
    /// Reader with PIN pad only.
    Class2,
}

/// Order requirements.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin_code: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mrtd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_reader: Option<CardReaderClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_number: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub certificate_policies: Vec<String>,
}

/// Who initiated the phone call for a phone order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallInitiator {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "RP")]
    Rp,
}

/// Body of `POST /phone/auth`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneAuthRequest {
    pub personal_number: String,
    pub call_initiator: CallInitiator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_visible_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_visible_data_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_non_visible_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement: Option<Requirement>,
}

/// Body of `POST /collect` and `POST /cancel`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_ref: String,
}

/// Error body returned by the RP API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub details: String,
}

/// Response of `POST /auth` and `POST /phone/auth`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub order_ref: String,
    #[serde(default)]
    pub auto_start_token: String,
    #[serde(default)]
    pub qr_start_token: String,
    pub qr_start_secret: SecretString,
}

/// Order status reported by collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectStatus {
    Pending,
    Complete,
    Failed,
    /// Anything the API adds later.
    #[serde(other)]
    Unknown,
}

/// Response of `POST /collect`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectResponse {
    #[serde(default)]
    pub order_ref: String,
    pub status: CollectStatus,
    #[serde(default)]
    pub hint_code: HintCode,
    #[serde(default)]
    pub completion_data: Option<CompletionData>,
}

/// Verified identity and device data of a completed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionData {
    pub user: CompletionUser,
    pub device: CompletionDevice,
    pub bank_id_issue_date: String,
    pub step_up: CompletionStepUp,
    pub signature: String,
    pub ocsp_response: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionUser {
    pub personal_number: String,
    pub name: String,
    pub given_name: String,
    pub surname: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionDevice {
    pub ip_address: String,
    pub uhi: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionStepUp {
    pub mrtd: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::json;

    #[test]
    fn test_auth_request_wire_format() {
        let request = AuthRequest::new("1.2.3.4", Some("aGVq".to_string()), "1.2.3.4.25");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "endUserIp": "1.2.3.4",
                "userVisibleData": "aGVq",
                "userVisibleDataFormat": "simpleMarkdownV1",
                "requirement": { "certificatePolicies": ["1.2.3.4.25"] }
            })
        );
    }

    #[test]
    fn test_auth_request_without_visible_data_omits_format() {
        let request = AuthRequest::new("1.2.3.4", None, "1.2.3.4.5");
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("userVisibleData").is_none());
        assert!(value.get("userVisibleDataFormat").is_none());
    }

    #[test]
    fn test_phone_auth_request_call_initiator() {
        let request = PhoneAuthRequest {
            personal_number: "199001011234".to_string(),
            call_initiator: CallInitiator::Rp,
            user_visible_data: None,
            user_visible_data_format: None,
            user_non_visible_data: None,
            requirement: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({ "personalNumber": "199001011234", "callInitiator": "RP" })
        );
    }

    #[test]
    fn test_auth_response_keeps_secret() {
        let response: AuthResponse = serde_json::from_value(json!({
            "orderRef": "131daac9-16c6-4618-beb0-365768f37288",
            "autoStartToken": "7c40b5c9-fa74-49cf-b98c-bfe651f9a7c6",
            "qrStartToken": "67df3917-fa0d-44e5-b327-edcc928297f8",
            "qrStartSecret": "d28db9a7-4cde-429e-a983-359be676944c"
        }))
        .unwrap();
        assert_eq!(
            response.qr_start_secret.expose_secret(),
            "d28db9a7-4cde-429e-a983-359be676944c"
        );
        assert!(!format!("{:?}", response).contains("d28db9a7"));
    }

    #[test]
    fn test_collect_response_unknown_status_and_hint() {
        let response: CollectResponse = serde_json::from_value(json!({
            "orderRef": "abc",
            "status": "paused",
            "hintCode": "somethingNew"
        }))
        .unwrap();
        assert_eq!(response.status, CollectStatus::Unknown);
        assert_eq!(response.hint_code, HintCode::Unknown);
        assert!(response.completion_data.is_none());
    }

    #[test]
    fn test_collect_response_complete() {
        let response: CollectResponse = serde_json::from_value(json!({
            "orderRef": "abc",
            "status": "complete",
            "completionData": {
                "user": {
                    "personalNumber": "190000000000",
                    "name": "Karl Karlsson",
                    "givenName": "Karl",
                    "surname": "Karlsson"
                },
                "device": { "ipAddress": "192.168.0.1", "uhi": "OZvYM9VvyiAmG7NA5jU5zqGcVpo=" },
                "bankIdIssueDate": "2020-02-01",
                "stepUp": { "mrtd": false },
                "signature": "PD94bWwgdmVyc2lvbj0iMS4wIj8+",
                "ocspResponse": "MIIHfgoBAKCCB3cw"
            }
        }))
        .unwrap();
        assert_eq!(response.status, CollectStatus::Complete);
        let data = response.completion_data.unwrap();
        assert_eq!(data.user.given_name, "Karl");
        assert_eq!(data.device.ip_address, "192.168.0.1");
        assert_eq!(data.bank_id_issue_date, "2020-02-01");
    }
}
