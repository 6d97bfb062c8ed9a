//! BankID environments and certificate policies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// RP API version used for every endpoint path.
pub const API_VERSION: &str = "6.0";

/// BankID environment, selecting the endpoint and the certificate policy OIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[serde(rename = "prod")]
    Production,
    #[default]
    Test,
}

impl Environment {
    /// Get the environment identifier string, also the certificate directory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "prod",
            Environment::Test => "test",
        }
    }

    /// Base URL of the RP API, without the versioned path.
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://appapi2.bankid.com",
            Environment::Test => "https://appapi2.test.bankid.com",
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct EnvironmentParseError;

impl fmt::Display for EnvironmentParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "expected one of: prod, production, test")
    }
}

impl std::error::Error for EnvironmentParseError {}

impl FromStr for Environment {
    type Err = EnvironmentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            _ => Err(EnvironmentParseError),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Certificate policies accepted for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificatePolicy {
    /// BankID on file (computer).
    OnFile,
    /// BankID on smart card.
    SmartCard,
    /// Mobile BankID.
    Mobile,
}

impl CertificatePolicy {
    /// OID for this policy. The test environment uses its own set.
    pub fn oid(&self, environment: Environment) -> &'static str {
        match (environment, self) {
            (Environment::Production, CertificatePolicy::OnFile) => "1.2.752.78.1.1",
            (Environment::Production, CertificatePolicy::SmartCard) => "1.2.752.78.1.2",
            (Environment::Production, CertificatePolicy::Mobile) => "1.2.752.78.1.5",
            (Environment::Test, CertificatePolicy::OnFile) => "1.2.3.4.5",
            (Environment::Test, CertificatePolicy::SmartCard) => "1.2.3.4.10",
            (Environment::Test, CertificatePolicy::Mobile) => "1.2.3.4.25",
        }
    }
}
