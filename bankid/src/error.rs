//! Error types for the `bankid` crate.
//!
//! Follows the same pattern as the rest of the workspace: a root Error struct holding an
//! error kind tree and an optional source for chaining.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for the bankid crate.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in bankid.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// Connection, TLS or timeout failures talking to the RP API.
    Transport(TransportErrorKind),
    /// The RP API answered with an `errorCode`.
    Api(ApiError),
    /// Certificate material could not be loaded. Fatal at startup.
    Provisioning(ProvisioningErrorKind),
    /// The RP API answered with a body we could not understand.
    Decode,
}

/// Errors from the HTTP transport.
#[derive(Debug, PartialEq)]
pub enum TransportErrorKind {
    BuilderFailed,
    Timeout,
    Connect,
    RequestFailed,
    UnexpectedStatus(u16),
    Network,
}

/// Error body returned by the RP API, e.g. `alreadyInProgress` or `invalidParameters`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: String,
    pub details: String,
}

/// Errors from loading the client certificate, key and CA bundle.
#[derive(Debug, PartialEq)]
pub enum ProvisioningErrorKind {
    MissingFile,
    InvalidIdentity,
    InvalidCa,
    ClientBuild,
}

impl Error {
    /// Returns the vendor error when this is an API error.
    pub fn api_error(&self) -> Option<&ApiError> {
        match &self.error_kind {
            ErrorKind::Api(api) => Some(api),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self.error_kind, ErrorKind::Transport(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Transport(kind) => write!(f, "Transport error: {:?}", kind),
            ErrorKind::Api(api) => write!(f, "BankID API error {}: {}", api.code, api.details),
            ErrorKind::Provisioning(kind) => write!(f, "Provisioning error: {:?}", kind),
            ErrorKind::Decode => write!(f, "Could not decode BankID response"),
        }?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            TransportErrorKind::BuilderFailed
        } else if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_request() {
            TransportErrorKind::RequestFailed
        } else {
            TransportErrorKind::Network
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Transport(error_kind),
        }
    }
}

/// Helper function to create API errors from a vendor error body.
pub fn api_error(code: &str, details: &str) -> Error {
    Error {
        source: None,
        error_kind: ErrorKind::Api(ApiError {
            code: code.to_string(),
            details: details.to_string(),
        }),
    }
}

/// Helper function to create provisioning errors.
pub fn provisioning_error(kind: ProvisioningErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Provisioning(kind),
    }
}

/// Helper function to create transport errors.
pub fn transport_error(kind: TransportErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Transport(kind),
    }
}

/// Helper function to create decode errors.
pub fn decode_error(err: serde_json::Error) -> Error {
    Error {
        source: Some(Box::new(err)),
        error_kind: ErrorKind::Decode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_exposes_vendor_details() {
        let err = api_error("alreadyInProgress", "Order already in progress");
        let api = err.api_error().unwrap();
        assert_eq!(api.code, "alreadyInProgress");
        assert_eq!(api.details, "Order already in progress");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_display_includes_source() {
        let err = provisioning_error(ProvisioningErrorKind::MissingFile, "cert.pem");
        let text = err.to_string();
        assert!(text.contains("MissingFile"));
        assert!(text.contains("cert.pem"));
    }
}
