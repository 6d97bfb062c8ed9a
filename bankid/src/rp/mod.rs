//! Client for the BankID relying party REST API.

mod client;
mod environment;
mod models;

pub use client::{RemoteClient, RpClient};
pub use environment::{CertificatePolicy, Environment, API_VERSION};
pub use models::{
    AuthRequest, AuthResponse, CallInitiator, CardReaderClass, CollectResponse, CollectStatus,
    CompletionData, CompletionDevice, CompletionStepUp, CompletionUser, ErrorResponse,
    OrderRequest, PhoneAuthRequest, Requirement, USER_VISIBLE_DATA_FORMAT,
};
