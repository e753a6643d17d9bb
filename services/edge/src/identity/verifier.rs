//! Downstream verification of signed identities.

use crate::identity::SignedIdentity;
use authgate_common::AuthError;
use base64::Engine;
use ring::signature::{UnparsedPublicKey, ECDSA_P256_SHA256_ASN1};
use std::time::Duration;
use tracing::warn;

/// Verifies edge-signed identities against the edge's public key.
///
/// Verification is a hard reject on any failure: stale timestamp,
/// undecodable signature, or cryptographic mismatch. There is no partial
/// trust.
pub struct IdentityVerifier {
    public_key: Vec<u8>,
    skew_window: Duration,
}

impl IdentityVerifier {
    /// Build a verifier for the given public key and replay window.
    #[must_use]
    pub fn new(public_key: Vec<u8>, skew_window: Duration) -> Self {
        Self {
            public_key,
            skew_window,
        }
    }

    /// Verify the signature and freshness of a signed identity.
    ///
    /// Requires `|now − timestamp| ≤ skew_window` in addition to the
    /// cryptographic check, bounding replay of captured headers.
    ///
    /// # Errors
    ///
    /// [`AuthError::SignatureInvalid`] naming what failed.
    pub fn verify(&self, identity: &SignedIdentity) -> Result<(), AuthError> {
        let now = chrono::Utc::now().timestamp_millis();
        let age = (now - identity.timestamp_millis).unsigned_abs();
        if age > self.skew_window.as_millis() as u64 {
            warn!(
                token_id = %identity.token_id,
                principal = %identity.principal,
                age_ms = age,
                "Rejected stale identity signature"
            );
            return Err(AuthError::signature("timestamp outside replay window"));
        }

        let signature = base64::engine::general_purpose::STANDARD
            .decode(&identity.signature)
            .map_err(|_| AuthError::signature("undecodable signature"))?;

        UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, &self.public_key)
            .verify(identity.canonical_payload().as_bytes(), &signature)
            .map_err(|_| {
                warn!(
                    token_id = %identity.token_id,
                    principal = %identity.principal,
                    "Rejected identity signature mismatch"
                );
                AuthError::signature("signature mismatch")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentitySigner;

    const SKEW: Duration = Duration::from_secs(60);

    fn pair() -> (IdentitySigner, IdentityVerifier) {
        let pkcs8 = IdentitySigner::generate_pkcs8().unwrap();
        let signer = IdentitySigner::from_pkcs8(&pkcs8).unwrap();
        let verifier = IdentityVerifier::new(signer.public_key(), SKEW);
        (signer, verifier)
    }

    #[test]
    fn test_round_trip_verifies() {
        let (signer, verifier) = pair();
        let identity = signer.sign_now(42, "alice", "jti-1").unwrap();
        verifier.verify(&identity).unwrap();
    }

    #[test]
    fn test_each_altered_field_fails() {
        let (signer, verifier) = pair();
        let identity = signer.sign_now(42, "alice", "jti-1").unwrap();

        let mut wrong_subject = identity.clone();
        wrong_subject.subject_id = 43;
        assert!(verifier.verify(&wrong_subject).is_err());

        let mut wrong_principal = identity.clone();
        wrong_principal.principal = "bob".to_string();
        assert!(verifier.verify(&wrong_principal).is_err());

        let mut wrong_token = identity.clone();
        wrong_token.token_id = "jti-2".to_string();
        assert!(verifier.verify(&wrong_token).is_err());

        let mut wrong_timestamp = identity.clone();
        wrong_timestamp.timestamp_millis += 1;
        assert!(verifier.verify(&wrong_timestamp).is_err());
    }

    #[test]
    fn test_stale_timestamp_fails_despite_valid_signature() {
        let (signer, verifier) = pair();
        let stale = chrono::Utc::now().timestamp_millis() - 120_000;
        let identity = signer.sign(42, "alice", "jti-1", stale).unwrap();

        let err = verifier.verify(&identity).unwrap_err();
        assert!(matches!(err, AuthError::SignatureInvalid { .. }));
    }

    #[test]
    fn test_future_skew_also_rejected() {
        let (signer, verifier) = pair();
        let future = chrono::Utc::now().timestamp_millis() + 120_000;
        let identity = signer.sign(42, "alice", "jti-1", future).unwrap();
        assert!(verifier.verify(&identity).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let (signer, _) = pair();
        let (_, other_verifier) = pair();
        let identity = signer.sign_now(42, "alice", "jti-1").unwrap();
        assert!(other_verifier.verify(&identity).is_err());
    }

    #[test]
    fn test_garbage_signature_fails() {
        let (signer, verifier) = pair();
        let mut identity = signer.sign_now(42, "alice", "jti-1").unwrap();
        identity.signature = "%%%not-base64%%%".to_string();
        assert!(matches!(
            verifier.verify(&identity),
            Err(AuthError::SignatureInvalid { .. })
        ));
    }
}
