//! Animated QR code payloads for cross-device orders.
//!
//! Each frame is `bankid.<qrStartToken>.<time>.<qrAuthCode>` where the auth code is
//! HMAC-SHA256 over the decimal frame index keyed with the order's `qrStartSecret`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of every QR payload.
pub const QR_PREFIX: &str = "bankid";

/// Hex encoded HMAC-SHA256 of `index` keyed with `secret`.
pub fn auth_code(secret: &str, index: usize) -> String {
    // HMAC accepts keys of any length, so this cannot fail.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take a key of any size");
    mac.update(index.to_string().as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Payload for frame `index`.
pub fn frame(start_token: &str, secret: &str, index: usize) -> String {
    format!(
        "{}.{}.{}.{}",
        QR_PREFIX,
        start_token,
        index,
        auth_code(secret, index)
    )
}

/// All `len` frames of an order, one per second of the session window.
pub fn code_sequence(start_token: &str, secret: &str, len: usize) -> Vec<String> {
    (0..len)
        .map(|index| frame(start_token, secret, index))
        .collect()
}
