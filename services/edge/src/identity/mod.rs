//! Signed per-request identity passed from the edge to downstream
//! services.

pub mod headers;
pub mod signer;
pub mod verifier;

pub use headers::ForwardedIdentity;
pub use signer::IdentitySigner;
pub use verifier::IdentityVerifier;

/// The identity tuple the edge vouches for, plus its signature.
///
/// The signature covers the canonical concatenation of the other four
/// fields; downstream verification additionally bounds the timestamp to
/// the configured replay window.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SignedIdentity {
    /// Numeric subject id of the verified bearer.
    pub subject_id: i64,
    /// Login principal of the verified bearer.
    pub principal: String,
    /// Id of the access token the edge validated.
    pub token_id: String,
    /// Signing time, unix milliseconds.
    pub timestamp_millis: i64,
    /// Base64 signature over the canonical payload.
    pub signature: String,
}

impl SignedIdentity {
    /// Canonical payload the signature is computed over.
    #[must_use]
    pub fn canonical_payload(&self) -> String {
        canonical_payload(
            self.subject_id,
            &self.principal,
            &self.token_id,
            self.timestamp_millis,
        )
    }
}

/// `subjectId|principal|tokenId|timestamp` — the signing input.
pub(crate) fn canonical_payload(
    subject_id: i64,
    principal: &str,
    token_id: &str,
    timestamp_millis: i64,
) -> String {
    format!("{subject_id}|{principal}|{token_id}|{timestamp_millis}")
}
