//! Callback signature verification.
//!
//! CardPay signs each callback with `hex(sha512(raw_body || callback_secret))`
//! and sends the digest in the `Signature` header.

use paygate_core::constant_time_eq;
use sha2::{Digest, Sha512};

/// Compute the signature CardPay sends for `body`
pub fn notification_signature(body: &[u8], secret: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(body);
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a callback signature in constant time
pub fn verify_notification(body: &[u8], signature: &str, secret: &str) -> bool {
    let expected = notification_signature(body, secret);
    constant_time_eq(&signature.trim().to_ascii_lowercase(), &expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_roundtrip() {
        let body = br#"{"merchant_order":{"id":"1"}}"#;
        let signature = notification_signature(body, "callback-secret");

        assert_eq!(signature.len(), 128);
        assert!(verify_notification(body, &signature, "callback-secret"));
        assert!(verify_notification(body, &signature.to_uppercase(), "callback-secret"));
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let body = br#"{"merchant_order":{"id":"1"}}"#;
        let signature = notification_signature(body, "callback-secret");

        assert!(!verify_notification(br#"{"merchant_order":{"id":"2"}}"#, &signature, "callback-secret"));
        assert!(!verify_notification(body, &signature, "other-secret"));
        assert!(!verify_notification(body, "", "callback-secret"));
    }

    #[test]
    fn test_known_digest() {
        // sha512("abc")
        assert_eq!(
            notification_signature(b"ab", "c"),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }
}
