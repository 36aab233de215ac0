//! Ed25519 request signature check for incoming interactions

use anyhow::{Context, Result, anyhow};
use ed25519_dalek::{Signature, VerifyingKey};

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Build from the hex encoded application public key.
    pub fn from_hex(public_key: &str) -> Result<Self> {
        let bytes: [u8; 32] = hex::decode(public_key.trim())
            .context("Public key is not valid hex")?
            .try_into()
            .map_err(|_| anyhow!("Public key must be 32 bytes"))?;
        let key = VerifyingKey::from_bytes(&bytes).context("Invalid ed25519 public key")?;
        Ok(Self { key })
    }

    /// True when `signature` (hex) signs `timestamp` followed by `body`.
    pub fn verify(&self, timestamp: &str, body: &[u8], signature: &str) -> bool {
        let Ok(bytes) = hex::decode(signature.trim()) else {
            return false;
        };
        let Ok(bytes) = <[u8; 64]>::try_from(bytes.as_slice()) else {
            return false;
        };
        let signature = Signature::from_bytes(&bytes);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key.verify_strict(&message, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    fn sign(key: &SigningKey, timestamp: &str, body: &[u8]) -> String {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        hex::encode(key.sign(&message).to_bytes())
    }

    #[test]
    fn test_verify_valid_signature() {
        let key = signing_key();
        let verifier =
            SignatureVerifier::from_hex(&hex::encode(key.verifying_key().to_bytes())).unwrap();
        let body = br#"{"type":1}"#;

        assert!(verifier.verify("1700000000", body, &sign(&key, "1700000000", body)));
    }

    #[test]
    fn test_rejects_tampering() {
        let key = signing_key();
        let verifier =
            SignatureVerifier::from_hex(&hex::encode(key.verifying_key().to_bytes())).unwrap();
        let body = br#"{"type":1}"#;
        let signature = sign(&key, "1700000000", body);

        assert!(!verifier.verify("1700000001", body, &signature));
        assert!(!verifier.verify("1700000000", br#"{"type":2}"#, &signature));
        assert!(!verifier.verify("1700000000", body, "not-hex"));
        assert!(!verifier.verify("1700000000", body, "abcd"));
    }

    #[test]
    fn test_from_hex_rejects_bad_keys() {
        assert!(SignatureVerifier::from_hex("zz").is_err());
        assert!(SignatureVerifier::from_hex("abcd").is_err());
    }
}
