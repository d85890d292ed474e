//! Project request signatures
//!
//! `hex(sha256(k1=v1|k2=v2|...|secret))` over every submitted field except
//! the signature itself, keys in byte order.

use crate::request::field;
use paygate_core::constant_time_eq;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

const GLUE: &str = "|";

/// Signature a project is expected to send with `params`
pub fn request_signature(params: &BTreeMap<String, String>, secret: &str) -> String {
    let mut signed = params
        .iter()
        .filter(|(key, _)| key.as_str() != field::SIGNATURE)
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(GLUE);
    signed.push_str(GLUE);
    signed.push_str(secret);

    hex::encode(Sha256::digest(signed.as_bytes()))
}

/// Check a submitted signature; hex case is ignored
pub fn verify_request(params: &BTreeMap<String, String>, signature: &str, secret: &str) -> bool {
    let expected = request_signature(params, secret);
    constant_time_eq(&expected, &signature.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("PP_PROJECT_ID".to_string(), "p1".to_string()),
            ("PP_AMOUNT".to_string(), "15.00".to_string()),
            ("PP_SIGNATURE".to_string(), "ignored".to_string()),
        ])
    }

    #[test]
    fn test_signed_string_layout() {
        let expected = hex::encode(Sha256::digest(b"PP_AMOUNT=15.00|PP_PROJECT_ID=p1|secret"));
        assert_eq!(request_signature(&params(), "secret"), expected);
    }

    #[test]
    fn test_verify() {
        let signature = request_signature(&params(), "secret");
        assert!(verify_request(&params(), &signature, "secret"));
        assert!(verify_request(&params(), &signature.to_uppercase(), "secret"));
        assert!(!verify_request(&params(), &signature, "other"));

        let mut tampered = params();
        tampered.insert("PP_AMOUNT".into(), "1.00".into());
        assert!(!verify_request(&tampered, &signature, "secret"));
    }
}
