//! Password digests.
//!
//! Account secrets are never stored in clear: the ledger keeps
//! `HMAC-SHA256(pepper, password)` as lowercase hex, and logins compare
//! digests in constant time.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 and return the hex-encoded result (64 characters).
///
/// # Errors
///
/// Returns `InvalidLength` if the HMAC implementation rejects the key.
/// HMAC-SHA256 accepts keys of any size, so this does not happen in practice.
pub fn hmac_sha256_hex(key: &str, message: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Digest stored for `password`.
///
/// # Errors
///
/// See [`hmac_sha256_hex`].
pub fn password_digest(pepper: &str, password: &str) -> Result<String, InvalidLength> {
    hmac_sha256_hex(pepper, password)
}

/// Constant-time string comparison.
///
/// Runs in time independent of where the inputs differ; only the length
/// check short-circuits.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
