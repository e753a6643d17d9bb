//! Asymmetric signing of the per-request identity tuple.

use crate::identity::{canonical_payload, SignedIdentity};
use authgate_common::AuthError;
use base64::Engine;
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};

/// Signs identity tuples with the edge's private key
/// (ECDSA P-256/SHA-256).
pub struct IdentitySigner {
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
}

impl IdentitySigner {
    /// Build a signer from a PKCS#8-encoded private key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key material is not a valid P-256 key.
    pub fn from_pkcs8(pkcs8: &[u8]) -> Result<Self, AuthError> {
        let rng = SystemRandom::new();
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8, &rng)
            .map_err(|_| AuthError::config("invalid identity signing key"))?;
        Ok(Self { key_pair, rng })
    }

    /// Generate a fresh PKCS#8 key pair for development and tests.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation fails.
    pub fn generate_pkcs8() -> Result<Vec<u8>, AuthError> {
        let rng = SystemRandom::new();
        EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            .map(|doc| doc.as_ref().to_vec())
            .map_err(|_| AuthError::internal("identity key generation failed"))
    }

    /// The public key bytes a verifier needs.
    #[must_use]
    pub fn public_key(&self) -> Vec<u8> {
        use ring::signature::KeyPair;
        self.key_pair.public_key().as_ref().to_vec()
    }

    /// Sign the identity tuple at the given timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing operation fails.
    pub fn sign(
        &self,
        subject_id: i64,
        principal: &str,
        token_id: &str,
        timestamp_millis: i64,
    ) -> Result<SignedIdentity, AuthError> {
        let payload = canonical_payload(subject_id, principal, token_id, timestamp_millis);
        let signature = self
            .key_pair
            .sign(&self.rng, payload.as_bytes())
            .map_err(|_| AuthError::internal("identity signing failed"))?;

        Ok(SignedIdentity {
            subject_id,
            principal: principal.to_string(),
            token_id: token_id.to_string(),
            timestamp_millis,
            signature: base64::engine::general_purpose::STANDARD.encode(signature.as_ref()),
        })
    }

    /// Sign the identity tuple at the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing operation fails.
    pub fn sign_now(
        &self,
        subject_id: i64,
        principal: &str,
        token_id: &str,
    ) -> Result<SignedIdentity, AuthError> {
        self.sign(
            subject_id,
            principal,
            token_id,
            chrono::Utc::now().timestamp_millis(),
        )
    }
}
