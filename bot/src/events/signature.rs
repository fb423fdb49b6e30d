//! Webhook signature verification

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::BotError;
use crate::utils::hex;

/// Header carrying the HMAC-SHA256 of the delivery body
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Verify a `sha256=<hex>` signature over the raw delivery body
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> Result<(), BotError> {
    let digest_hex = signature
        .trim()
        .strip_prefix("sha256=")
        .ok_or_else(|| BotError::SignatureError("signature must use sha256=<hex> format".to_string()))?;
    let expected = hex::decode(digest_hex).map_err(BotError::SignatureError)?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| BotError::SignatureError(format!("failed to initialize verifier: {e}")))?;
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| BotError::SignatureError("signature verification failed".to_string()))
}

/// Compute the header value GitHub would send for `payload`
pub fn sign(payload: &[u8], secret: &str) -> Result<String, BotError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| BotError::SignatureError(format!("failed to initialize signer: {e}")))?;
    mac.update(payload);
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}
