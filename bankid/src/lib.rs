//! # bankid
//!
//! Relying party side of a BankID authentication:
//! - Mutual-TLS client for the BankID RP REST surface (auth, phone auth, collect, cancel)
//! - Rotating QR code sequence derived from the order's start secret
//! - Hint code message table
//! - In-memory transaction cache with fixed expiry
//! - Status engine turning collect results into a pending/complete/failed outcome
//! - Session façade (start, status, cancel) and a push-style poller
//!
//! ## Architecture
//!
//! The `web` crate drives a [`Session`] held in application state. Each status request
//! performs exactly one collect call; the [`poll::Poller`] offers the same engine as a
//! background task publishing events into a bounded channel.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bankid::{
//!     http::TlsMaterial,
//!     rp::{Environment, RpClient},
//!     Session, SessionConfig,
//! };
//!
//! let tls = TlsMaterial::load_for_environment("certificates", Environment::Test)?;
//! let client = RpClient::new(Environment::Test, tls, Duration::from_secs(10))?;
//! let session = Arc::new(Session::new(client, SessionConfig::default()));
//! ```

pub mod cache;
pub mod details;
pub mod error;
pub mod hint;
pub mod http;
pub mod poll;
pub mod provider;
pub mod qr;
pub mod rp;
pub mod session;
pub mod status;
pub mod transaction;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
pub use provider::{Provider, ProviderKind, StartRequest, StartResponse};
pub use session::{is_mobile_user_agent, Session, SessionConfig};
pub use status::{Status, StatusResponse};
