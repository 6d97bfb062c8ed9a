use std::path::{Path, PathBuf};
use std::time::Duration;

use bankid::details::UserDetailType;
use bankid::poll::{Backoff, PollerConfig};
use bankid::rp::Environment;
use bankid::SessionConfig;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that are allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(short, long, env, default_value_t = LevelFilter::Info)]
    pub log_level_filter: LevelFilter,

    /// Take the end user IP from the first `X-Forwarded-For` entry. Enable only behind a proxy.
    #[arg(long, env, default_value_t = false)]
    pub trust_forwarded_for: bool,

    /// The BankID environment to talk to: `prod` or `test`.
    #[arg(short, long, env, default_value_t = Environment::Test)]
    pub bankid_env: Environment,

    /// Directory holding one sub-directory per environment with cert.pem, key.pem and ca-cert.pem.
    #[arg(long, env, default_value = "certificates")]
    certificate_dir: PathBuf,

    /// Name of this relying party as shown in the BankID app.
    #[arg(long, env, default_value = "Identity")]
    pub service_name: String,

    /// Extra message shown in the BankID app below the requested details.
    #[arg(long, env, default_value = "")]
    pub visible_message: String,

    /// Domain attribute of the transaction cookie. Host-only when unset.
    #[arg(long, env)]
    cookie_domain: Option<String>,

    /// Where the BankID app returns after a same-device authentication.
    #[arg(long, env, default_value = "null")]
    pub redirect_url: String,

    /// Launch the app through the `bankid:///` scheme instead of the universal link.
    #[arg(long, env, default_value_t = true, action = clap::ArgAction::Set)]
    pub app_link: bool,

    /// User details released on completion, e.g. `firstName,lastName,personalNumber`.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "firstName,lastName"
    )]
    pub requested_details: Vec<UserDetailType>,

    /// Lifetime of an authentication in seconds. Also the length of the QR sequence.
    #[arg(long, env, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub session_timeout_secs: u64,

    /// Timeout in seconds for a single call to the BankID API
    #[arg(long, env, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout_secs: u64,

    /// Seconds between collect calls when streaming status events
    #[arg(long, env, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_secs: u64,

    /// Retries of a failed collect call before a streamed authentication is given up
    #[arg(long, env, default_value_t = 3)]
    pub max_transport_retries: u32,

    /// Seconds between sweeps of expired transactions
    #[arg(long, env, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub cache_sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        // Defaults and environment only, the test harness owns the command line.
        Self::parse_from(["identity_rs"])
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn set_certificate_dir(mut self, certificate_dir: PathBuf) -> Self {
        self.certificate_dir = certificate_dir;
        self
    }

    pub fn certificate_dir(&self) -> &Path {
        &self.certificate_dir
    }

    pub fn cookie_domain(&self) -> Option<&str> {
        self.cookie_domain.as_deref()
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }

    /// Production BankID implies a production deployment, which gets secure cookies.
    pub fn is_production(&self) -> bool {
        self.bankid_env.is_production()
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            service_name: self.service_name.clone(),
            session_timeout: self.session_timeout(),
            redirect_url: self.redirect_url.clone(),
            requested_details: self.requested_details.clone(),
            app_link: self.app_link,
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            backoff: Backoff::new(self.max_transport_retries),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("identity_rs").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.session_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.cache_sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.redirect_url, "null");
        assert!(config.app_link);
        assert!(!config.trust_forwarded_for);
        assert_eq!(
            config.requested_details,
            vec![UserDetailType::FirstName, UserDetailType::LastName]
        );
    }

    #[test]
    fn test_production_environment() {
        let config = parse(&["--bankid-env", "prod"]);
        assert_eq!(config.bankid_env, Environment::Production);
        assert!(config.is_production());

        let config = parse(&["--bankid-env", "test"]);
        assert!(!config.is_production());
    }

    #[test]
    fn test_zero_timings_are_rejected() {
        for flag in [
            "--session-timeout-secs",
            "--request-timeout-secs",
            "--poll-interval-secs",
            "--cache-sweep-interval-secs",
        ] {
            let result = Config::try_parse_from(["identity_rs", flag, "0"]);
            assert!(result.is_err(), "{flag} accepted 0");
        }

        let config = parse(&["--poll-interval-secs", "1"]);
        assert_eq!(config.poller_config().interval, Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_environment_is_rejected() {
        let result = Config::try_parse_from(["identity_rs", "--bankid-env", "staging"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_session_config_from_flags() {
        let config = parse(&[
            "--service-name",
            "Acme",
            "--session-timeout-secs",
            "45",
            "--app-link",
            "false",
            "--requested-details",
            "personalNumber,ipAddress",
        ]);
        let session = config.session_config();
        assert_eq!(session.service_name, "Acme");
        assert_eq!(session.session_timeout, Duration::from_secs(45));
        assert!(!session.app_link);
        assert_eq!(
            session.requested_details,
            vec![UserDetailType::PersonalNumber, UserDetailType::IpAddress]
        );
    }

    #[test]
    fn test_poller_config_from_flags() {
        let config = parse(&["--poll-interval-secs", "5", "--max-transport-retries", "1"]);
        let poller = config.poller_config();
        assert_eq!(poller.interval, Duration::from_secs(5));
        assert_eq!(poller.backoff.max_retries(), 1);
    }
}
