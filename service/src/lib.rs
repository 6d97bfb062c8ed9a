use std::sync::Arc;

use bankid::http::TlsMaterial;
use bankid::rp::RpClient;
use bankid::{Provider, Session};
use config::Config;
use log::info;

pub mod config;
pub mod logging;

/// Load the client certificate for the configured environment and build the BankID session.
///
/// Fails with a provisioning error when the certificate material is missing or malformed.
pub fn init_bankid(config: &Config) -> Result<Arc<Session<RpClient>>, bankid::Error> {
    info!(
        "BankID config: environment={}, certificate_dir={}, session_timeout={}s, request_timeout={}s",
        config.bankid_env,
        config.certificate_dir().display(),
        config.session_timeout_secs,
        config.request_timeout_secs,
    );

    let tls = TlsMaterial::load_for_environment(config.certificate_dir(), config.bankid_env)?;
    let client = RpClient::new(config.bankid_env, tls, config.request_timeout())?;

    Ok(Arc::new(Session::new(client, config.session_config())))
}

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn Provider>,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            config: app_config,
        }
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }
}
