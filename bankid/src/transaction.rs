//! In-flight authentication orders.

use std::time::Duration;

use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

/// State kept for one order between start and expiry.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Opaque handle given to the browser.
    pub key: String,
    pub order_ref: String,
    pub same_device: bool,
    pub is_mobile: bool,
    /// IP of the browser that started the order.
    pub origin_ip: String,
    /// QR payloads, empty for same-device orders.
    pub code_sequence: Vec<String>,
    pub started_at: Instant,
}

impl Transaction {
    pub fn is_cross_device(&self) -> bool {
        !self.same_device
    }

    /// Index of the QR frame to show at `now`.
    ///
    /// Wraps around the sequence, whose length is the session window in seconds.
    pub fn qr_frame_index(&self, now: Instant, session_timeout: Duration) -> Option<usize> {
        let window = session_timeout.as_secs() as usize;
        if self.code_sequence.is_empty() || window == 0 {
            return None;
        }
        let elapsed = now.saturating_duration_since(self.started_at).as_secs() as usize;
        Some(elapsed % window % self.code_sequence.len())
    }

    /// QR payload to show at `now`, if this is a cross-device order.
    pub fn qr_frame(&self, now: Instant, session_timeout: Duration) -> Option<&str> {
        self.qr_frame_index(now, session_timeout)
            .map(|index| self.code_sequence[index].as_str())
    }
}

/// Derive the external handle for an order.
///
/// The order reference is public to anyone who sees the vendor traffic, so it is salted
/// with 32 random bytes before hashing.
pub fn derive_key(order_ref: &str) -> String {
    let salt: [u8; 32] = rand::thread_rng().gen();
    let mut hasher = Sha256::new();
    hasher.update(order_ref.as_bytes());
    hasher.update(salt);
    hex::encode(hasher.finalize())
}
