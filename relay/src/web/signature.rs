//! GitHub webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw request body and
//! sends the result in `X-Hub-Signature-256` as `sha256=<lowercase hex>`.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the `sha256=<hex>` signature GitHub would send for `body`.
pub fn sign_github_payload(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("github_signature_invalid_key");
            return None;
        }
    };
    mac.update(body);

    Some(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Verify a GitHub webhook signature.
///
/// # Arguments
///
/// * `secret` - The webhook secret configured on GitHub
/// * `body` - The exact bytes received, before any parsing
/// * `signature` - The `X-Hub-Signature-256` header, or `""` when absent
///
/// # Returns
///
/// `true` only if `signature` equals the computed value exactly.
pub fn verify_github_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let expected_signature = match sign_github_payload(secret, body) {
        Some(s) => s,
        None => return false,
    };

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(&expected_signature, signature);

    if !valid {
        warn!(
            has_signature = !signature.is_empty(),
            has_prefix = signature.starts_with(SIGNATURE_PREFIX),
            expected_length = expected_signature.len(),
            actual_length = signature.len(),
            body_length = body.len(),
            "github_signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
