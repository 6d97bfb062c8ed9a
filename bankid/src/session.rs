//! Session façade: start, status and cancel over the RP client and transaction cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::*;
use secrecy::ExposeSecret;
use tokio::time::Instant;

use crate::cache::TransactionCache;
use crate::details::{self, UserDetailType, DEFAULT_DETAILS};
use crate::error::Error;
use crate::poll::{Poller, PollerConfig};
use crate::provider::{Provider, ProviderKind, StartRequest, StartResponse};
use crate::qr;
use crate::rp::{CertificatePolicy, RemoteClient};
use crate::status::{self, Status, StatusResponse};
use crate::transaction::{derive_key, Transaction};

/// Browser user agent fragments that identify a mobile client.
const MOBILE_USER_AGENTS: [&str; 4] = ["Mobile", "Android", "iPhone", "iPad"];

/// Returns true when the user agent belongs to a phone or tablet.
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    MOBILE_USER_AGENTS
        .iter()
        .any(|fragment| user_agent.contains(fragment))
}

/// Session engine configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the relying party, shown in the app.
    pub service_name: String,
    /// How long an order stays valid. Also the number of QR frames.
    pub session_timeout: Duration,
    /// Where the app returns after a same-device order.
    pub redirect_url: String,
    /// Details released to the relying party on completion.
    pub requested_details: Vec<UserDetailType>,
    /// Launch through the `bankid:///` scheme rather than the universal link.
    pub app_link: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            service_name: "Identity".to_string(),
            session_timeout: Duration::from_secs(30),
            redirect_url: "null".to_string(),
            requested_details: Vec::new(),
            app_link: true,
        }
    }
}

/// BankID session engine.
///
/// Constructed once and shared through application state.
pub struct Session<C: RemoteClient> {
    client: Arc<C>,
    cache: Arc<TransactionCache>,
    config: SessionConfig,
}

impl<C: RemoteClient + 'static> Session<C> {
    pub fn new(client: C, config: SessionConfig) -> Self {
        Self {
            client: Arc::new(client),
            cache: Arc::new(TransactionCache::for_session_timeout(config.session_timeout)),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<TransactionCache> {
        &self.cache
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Live transaction behind `key`.
    pub fn transaction(&self, key: &str) -> Option<Arc<Transaction>> {
        self.cache.get(key)
    }

    /// Mobile BankID for cross-device or mobile browsers, BankID on file otherwise.
    pub fn certificate_policy(same_device: bool, is_mobile: bool) -> CertificatePolicy {
        if is_mobile || !same_device {
            CertificatePolicy::Mobile
        } else {
            CertificatePolicy::OnFile
        }
    }

    /// Link that opens the app for a same-device order.
    pub fn launch_url(auto_start_token: &str, redirect_url: &str, app_link: bool) -> String {
        let redirect = urlencoding::encode(redirect_url);
        if app_link {
            format!(
                "bankid:///?autostarttoken={}&redirect={}",
                auto_start_token, redirect
            )
        } else {
            format!(
                "https://app.bankid.com/?autostarttoken={}&redirect={}",
                auto_start_token, redirect
            )
        }
    }

    /// Markdown shown in the app, before base64 encoding.
    pub fn user_visible_text(&self, message: &str) -> String {
        let service = &self.config.service_name;
        let requested = if self.config.requested_details.is_empty() {
            &DEFAULT_DETAILS[..]
        } else {
            &self.config.requested_details[..]
        };

        let mut text = format!(
            "# On behalf of {}\n{} would like to use BankID to access the following details",
            service, service
        );
        for detail in requested {
            text.push_str(&format!("\n+ *{}*", detail.description()));
        }
        if !message.is_empty() {
            text.push_str(&format!("\n\nMessage from {}:\n\"{}\"", service, message));
        }
        text
    }

    fn user_visible_data(&self, message: &str) -> String {
        STANDARD.encode(self.user_visible_text(message))
    }

    /// Start an order and store its transaction.
    pub async fn start(&self, request: StartRequest) -> Result<StartResponse, Error> {
        let policy = Self::certificate_policy(request.same_device, request.is_mobile);
        let order = match self
            .client
            .initiate_auth(
                &request.user_ip,
                Some(self.user_visible_data(&request.message_for_user)),
                policy,
            )
            .await
        {
            Ok(order) => order,
            Err(err) => match err.api_error() {
                Some(api) => {
                    warn!("BankID refused to start an order: {}", api.code);
                    return Ok(StartResponse::failure(&api.details));
                }
                None => return Err(err),
            },
        };

        let key = derive_key(&order.order_ref);
        let mut response = StartResponse {
            success: true,
            transaction_key: Some(key.clone()),
            ..Default::default()
        };

        let code_sequence = if request.same_device {
            response.launch_url = Some(Self::launch_url(
                &order.auto_start_token,
                &self.config.redirect_url,
                self.config.app_link,
            ));
            Vec::new()
        } else {
            let sequence = qr::code_sequence(
                &order.qr_start_token,
                order.qr_start_secret.expose_secret(),
                self.config.session_timeout.as_secs() as usize,
            );
            response.qr_code_data = sequence.first().cloned();
            sequence
        };

        self.cache.put(
            &key,
            Transaction {
                key: key.clone(),
                order_ref: order.order_ref,
                same_device: request.same_device,
                is_mobile: request.is_mobile,
                origin_ip: request.user_ip,
                code_sequence,
                started_at: Instant::now(),
            },
        );
        debug!(
            "Stored BankID transaction (same device: {}, mobile: {})",
            request.same_device, request.is_mobile
        );

        Ok(response)
    }

    /// Collect the order behind `key` once and interpret the result.
    pub async fn status(&self, key: &str) -> Result<StatusResponse, Error> {
        if self.cache.get(key).is_none() {
            debug!("Status requested for unknown BankID transaction");
            return Ok(StatusResponse::not_found());
        }

        let _guard = self.cache.lock(key).await;
        // Cancelled or expired while waiting for the lock.
        let Some(transaction) = self.cache.get(key) else {
            return Ok(StatusResponse::not_found());
        };

        let collected = self.client.collect(&transaction.order_ref).await?;
        let mut response = status::resolve(
            &transaction,
            collected,
            Instant::now(),
            self.config.session_timeout,
        );

        match response.status {
            Status::Complete => {
                info!("BankID order {} completed", transaction.order_ref);
                response.details = response
                    .completion_data()
                    .map(|data| details::user_details(&self.config.requested_details, data));
            }
            Status::Failed => {
                info!(
                    "BankID order {} failed: {}",
                    transaction.order_ref, response.message
                );
            }
            Status::Pending => {}
        }

        Ok(response)
    }

    /// Drop the transaction behind `key` and cancel its order in the background.
    pub async fn cancel(&self, key: &str) {
        let Some(transaction) = self.cache.delete(key) else {
            // Already expired, nothing to undo.
            debug!("Cancel requested for unknown BankID transaction");
            return;
        };

        let client = Arc::clone(&self.client);
        let order_ref = transaction.order_ref.clone();
        tokio::spawn(async move {
            if let Err(e) = client.cancel(&order_ref).await {
                warn!("Failed to cancel BankID order {}: {}", order_ref, e);
            }
        });
    }
}

#[async_trait]
impl<C: RemoteClient + 'static> Provider for Session<C> {
    fn provider(&self) -> ProviderKind {
        ProviderKind::BankId
    }

    async fn start(&self, request: StartRequest) -> Result<StartResponse, Error> {
        Session::start(self, request).await
    }

    async fn status(&self, key: &str) -> Result<StatusResponse, Error> {
        Session::status(self, key).await
    }

    async fn cancel(&self, key: &str) {
        Session::cancel(self, key).await
    }

    fn watch(self: Arc<Self>, key: &str, config: PollerConfig) -> Poller {
        Session::watch(&self, key, config)
    }
}
