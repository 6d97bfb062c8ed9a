//! Mutual-TLS client for the RP API.

use std::time::Duration;

use async_trait::async_trait;
use log::*;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use super::{
    AuthRequest, AuthResponse, CertificatePolicy, CollectResponse, Environment, ErrorResponse,
    OrderRequest, PhoneAuthRequest, API_VERSION,
};
use crate::error::{api_error, decode_error, transport_error, Error, TransportErrorKind};
use crate::http::{ClientBuilder, TlsMaterial};

/// Transport to the RP API.
///
/// Implementations perform exactly one request per call and never retry; the caller
/// decides what to do with a transport error.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Environment the client talks to, selecting certificate policy OIDs.
    fn environment(&self) -> Environment;

    /// Start an authentication order.
    async fn auth(&self, request: &AuthRequest) -> Result<AuthResponse, Error>;

    /// Start an authentication order over the phone.
    async fn phone_auth(&self, request: &PhoneAuthRequest) -> Result<AuthResponse, Error>;

    /// Poll an order once.
    async fn collect(&self, order_ref: &str) -> Result<CollectResponse, Error>;

    /// Cancel an outstanding order.
    async fn cancel(&self, order_ref: &str) -> Result<(), Error>;

    /// Start an order for `ip`, limited to `policy`.
    ///
    /// `user_visible_data` must already be base64 encoded.
    async fn initiate_auth(
        &self,
        ip: &str,
        user_visible_data: Option<String>,
        policy: CertificatePolicy,
    ) -> Result<AuthResponse, Error> {
        let request = AuthRequest::new(ip, user_visible_data, policy.oid(self.environment()));
        self.auth(&request).await
    }
}

/// RP API client.
pub struct RpClient {
    client: reqwest::Client,
    base_url: String,
    environment: Environment,
}

impl RpClient {
    /// Create a client for `environment` presenting the given certificate material.
    pub fn new(
        environment: Environment,
        tls: TlsMaterial,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = ClientBuilder::new()
            .with_tls(tls)
            .with_timeout(timeout)
            .build()?;
        Ok(Self::with_client(
            client,
            environment.base_url().to_string(),
            environment,
        ))
    }

    /// Create a client on top of an existing reqwest client and base URL.
    pub fn with_client(client: reqwest::Client, base_url: String, environment: Environment) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            environment,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rp/v{}{}", self.base_url, API_VERSION, path)
    }

    pub fn auth_url(&self) -> String {
        self.url("/auth")
    }

    pub fn phone_auth_url(&self) -> String {
        self.url("/phone/auth")
    }

    pub fn collect_url(&self) -> String {
        self.url("/collect")
    }

    pub fn cancel_url(&self) -> String {
        self.url("/cancel")
    }

    async fn post<Req, Resp>(&self, url: &str, body: &Req) -> Result<Resp, Error>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let response = self.client.post(url).json(body).send().await.map_err(|e| {
            warn!("BankID request to {} failed: {:?}", url, e);
            Error::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        // An empty body is a valid answer from /cancel.
        let text = if text.trim().is_empty() { "{}" } else { &text };

        if let Ok(error) = serde_json::from_str::<ErrorResponse>(text) {
            if !error.error_code.is_empty() {
                warn!(
                    "BankID API error from {}: {} - {}",
                    url, error.error_code, error.details
                );
                return Err(api_error(&error.error_code, &error.details));
            }
        }

        if !status.is_success() {
            warn!("BankID API returned {} from {}", status, url);
            return Err(transport_error(
                TransportErrorKind::UnexpectedStatus(status.as_u16()),
                text,
            ));
        }

        serde_json::from_str(text).map_err(|e| {
            warn!("Failed to parse BankID response from {}: {:?}", url, e);
            decode_error(e)
        })
    }
}

#[async_trait]
impl RemoteClient for RpClient {
    fn environment(&self) -> Environment {
        self.environment
    }

    async fn auth(&self, request: &AuthRequest) -> Result<AuthResponse, Error> {
        debug!("Starting BankID order for {}", request.end_user_ip);
        let response: AuthResponse = self.post(&self.auth_url(), request).await?;
        info!("Started BankID order {}", response.order_ref);
        Ok(response)
    }

    async fn phone_auth(&self, request: &PhoneAuthRequest) -> Result<AuthResponse, Error> {
        debug!("Starting BankID phone order");
        let response: AuthResponse = self.post(&self.phone_auth_url(), request).await?;
        info!("Started BankID phone order {}", response.order_ref);
        Ok(response)
    }

    async fn collect(&self, order_ref: &str) -> Result<CollectResponse, Error> {
        let request = OrderRequest {
            order_ref: order_ref.to_string(),
        };
        let response: CollectResponse = self.post(&self.collect_url(), &request).await?;
        trace!(
            "Collected BankID order {}: {:?}/{:?}",
            order_ref,
            response.status,
            response.hint_code
        );
        Ok(response)
    }

    async fn cancel(&self, order_ref: &str) -> Result<(), Error> {
        let request = OrderRequest {
            order_ref: order_ref.to_string(),
        };
        let _: IgnoredAny = self.post(&self.cancel_url(), &request).await?;
        info!("Cancelled BankID order {}", order_ref);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ErrorKind};
    use crate::hint::HintCode;
    use crate::rp::{CallInitiator, CollectStatus};
    use mockito::{Matcher, Server, ServerGuard};
    use secrecy::ExposeSecret;
    use serde_json::json;

    async fn setup_test_server() -> ServerGuard {
        Server::new_async().await
    }

    fn client_for(server: &ServerGuard) -> RpClient {
        RpClient::with_client(
            reqwest::Client::new(),
            server.url(),
            Environment::Test,
        )
    }

    #[test]
    fn test_urls_include_api_version() {
        let client = RpClient::with_client(
            reqwest::Client::new(),
            "https://appapi2.test.bankid.com/".to_string(),
            Environment::Test,
        );
        assert_eq!(
            client.auth_url(),
            "https://appapi2.test.bankid.com/rp/v6.0/auth"
        );
        assert_eq!(
            client.phone_auth_url(),
            "https://appapi2.test.bankid.com/rp/v6.0/phone/auth"
        );
        assert_eq!(
            client.collect_url(),
            "https://appapi2.test.bankid.com/rp/v6.0/collect"
        );
        assert_eq!(
            client.cancel_url(),
            "https://appapi2.test.bankid.com/rp/v6.0/cancel"
        );
    }

    #[tokio::test]
    async fn test_initiate_auth_success() {
        let mut server = setup_test_server().await;
        let _mock = server
            .mock("POST", "/rp/v6.0/auth")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "endUserIp": "1.2.3.4",
                "requirement": { "certificatePolicies": ["1.2.3.4.25"] }
            })))
            .with_status(200)
            .with_body(
                json!({
                    "orderRef": "order-1",
                    "autoStartToken": "auto-1",
                    "qrStartToken": "qr-1",
                    "qrStartSecret": "secret-1"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client
            .initiate_auth("1.2.3.4", None, CertificatePolicy::Mobile)
            .await
            .unwrap();

        assert_eq!(response.order_ref, "order-1");
        assert_eq!(response.auto_start_token, "auto-1");
        assert_eq!(response.qr_start_token, "qr-1");
        assert_eq!(response.qr_start_secret.expose_secret(), "secret-1");
    }

    #[tokio::test]
    async fn test_auth_api_error_is_distinct_from_transport() {
        let mut server = setup_test_server().await;
        let _mock = server
            .mock("POST", "/rp/v6.0/auth")
            .with_status(400)
            .with_body(
                json!({
                    "errorCode": "alreadyInProgress",
                    "details": "Order already in progress for pno"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .initiate_auth("1.2.3.4", None, CertificatePolicy::OnFile)
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Api(ApiError {
                code: "alreadyInProgress".to_string(),
                details: "Order already in progress for pno".to_string(),
            })
        );
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_unexpected_status_without_error_body_is_transport_error() {
        let mut server = setup_test_server().await;
        let _mock = server
            .mock("POST", "/rp/v6.0/collect")
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.collect("order-1").await.unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Transport(TransportErrorKind::UnexpectedStatus(503))
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let client = RpClient::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:9".to_string(),
            Environment::Test,
        );
        let err = client.collect("order-1").await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_collect_pending() {
        let mut server = setup_test_server().await;
        let _mock = server
            .mock("POST", "/rp/v6.0/collect")
            .match_body(Matcher::Json(json!({ "orderRef": "order-1" })))
            .with_status(200)
            .with_body(
                json!({
                    "orderRef": "order-1",
                    "status": "pending",
                    "hintCode": "outstandingTransaction"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client.collect("order-1").await.unwrap();
        assert_eq!(response.status, CollectStatus::Pending);
        assert_eq!(response.hint_code, HintCode::OutstandingTransaction);
    }

    #[tokio::test]
    async fn test_collect_malformed_body_is_decode_error() {
        let mut server = setup_test_server().await;
        let _mock = server
            .mock("POST", "/rp/v6.0/collect")
            .with_status(200)
            .with_body("{\"orderRef\": 12}")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.collect("order-1").await.unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_cancel_accepts_empty_body() {
        let mut server = setup_test_server().await;
        let mock = server
            .mock("POST", "/rp/v6.0/cancel")
            .match_body(Matcher::Json(json!({ "orderRef": "order-1" })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(&server);
        client.cancel("order-1").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_phone_auth() {
        let mut server = setup_test_server().await;
        let _mock = server
            .mock("POST", "/rp/v6.0/phone/auth")
            .match_body(Matcher::PartialJson(json!({
                "personalNumber": "199001011234",
                "callInitiator": "user"
            })))
            .with_status(200)
            .with_body(
                json!({
                    "orderRef": "order-2",
                    "qrStartSecret": "unused"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client
            .phone_auth(&PhoneAuthRequest {
                personal_number: "199001011234".to_string(),
                call_initiator: CallInitiator::User,
                user_visible_data: None,
                user_visible_data_format: None,
                user_non_visible_data: None,
                requirement: None,
            })
            .await
            .unwrap();
        assert_eq!(response.order_ref, "order-2");
        assert!(response.auto_start_token.is_empty());
    }
}
