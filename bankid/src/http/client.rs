//! HTTP client builder for the RP API.

use std::time::Duration;

use crate::error::Error;
use crate::http::TlsMaterial;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Whole-request timeout. Expiry surfaces as a transport error.
    pub timeout: Duration,
    /// TCP + TLS handshake timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            user_agent: format!("bankid-rp/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for the reqwest client used against the RP API.
///
/// The client never retries on its own; retry policy belongs to the poller.
pub struct ClientBuilder {
    config: HttpClientConfig,
    tls: Option<TlsMaterial>,
}

impl ClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
            tls: None,
        }
    }

    /// Present this client certificate and trust only the given CA bundle.
    pub fn with_tls(mut self, tls: TlsMaterial) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    /// Build the configured HTTP client.
    pub fn build(self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(self.config.timeout)
            .connect_timeout(self.config.connect_timeout)
            .user_agent(self.config.user_agent);

        if let Some(tls) = self.tls {
            builder = builder
                .identity(tls.identity().clone())
                .tls_built_in_root_certs(false);
            for root in tls.roots() {
                builder = builder.add_root_certificate(root.clone());
            }
        }

        Ok(builder.build()?)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
