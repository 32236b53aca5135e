//! Signature primitives for payment vendor requests and webhooks.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Signs a payload using HMAC-SHA256, hex encoded.
pub fn hmac_sha256_hex(payload: &[u8], secret: &str) -> String {
    use hmac::{Hmac, Mac};

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// `md5(base64(body) + secret)`, hex encoded.
pub fn base64_md5_sign(body: &[u8], secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(STANDARD.encode(body).as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares a computed signature with a presented one in constant time.
/// Hex case is ignored.
pub fn signatures_match(expected: &str, presented: &str) -> bool {
    let presented = presented.trim().to_ascii_lowercase();
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}
