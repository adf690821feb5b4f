//! `X-Hub-Signature-256` verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Why a delivery's signature was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,
    #[error("signature header is not 'sha256=<hex>'")]
    Malformed,
    #[error("signature does not match payload")]
    Mismatch,
}

/// The shared secret configured on the GitHub webhook.
#[derive(Clone)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    /// Returns `None` for an empty secret.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret.into_bytes()))
        }
    }

    /// Checks `header` (the `X-Hub-Signature-256` value) against the
    /// HMAC-SHA256 of `body`. The comparison is constant-time.
    pub fn verify(&self, body: &[u8], header: Option<&str>) -> Result<(), SignatureError> {
        let header = header.ok_or(SignatureError::Missing)?;
        let hex_digest = header
            .strip_prefix(SIGNATURE_PREFIX)
            .ok_or(SignatureError::Malformed)?;
        let expected = hex::decode(hex_digest).map_err(|_| SignatureError::Malformed)?;

        // HMAC accepts keys of any length.
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.0) else {
            return Err(SignatureError::Mismatch);
        };
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}

#[cfg(test)]
pub(crate) fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_documented_example_verifies() {
        // Example from GitHub's "Validating webhook deliveries" guide.
        let secret = WebhookSecret::new("It's a Secret to Everybody").unwrap();
        let header = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";
        assert_eq!(secret.verify(b"Hello, World!", Some(header)), Ok(()));
    }

    #[test]
    fn round_trips_own_signature() {
        let secret = WebhookSecret::new("s3cret").unwrap();
        let body = br#"{"zen":"Keep it logically awesome."}"#;
        assert_eq!(secret.verify(body, Some(&sign("s3cret", body))), Ok(()));
    }

    #[test]
    fn rejects_missing_malformed_and_wrong_signatures() {
        let secret = WebhookSecret::new("s3cret").unwrap();
        let body = b"payload";
        assert_eq!(secret.verify(body, None), Err(SignatureError::Missing));
        assert_eq!(
            secret.verify(body, Some("sha1=abcd")),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            secret.verify(body, Some("sha256=zz")),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            secret.verify(body, Some(&sign("other", body))),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            secret.verify(b"tampered", Some(&sign("s3cret", body))),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn empty_secret_is_none_and_debug_is_redacted() {
        assert!(WebhookSecret::new("").is_none());
        let secret = WebhookSecret::new("hunter2").unwrap();
        assert!(!format!("{secret:?}").contains("hunter2"));
    }
}
