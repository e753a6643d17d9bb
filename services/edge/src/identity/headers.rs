//! Trust headers carried from the edge to downstream services.
//!
//! Framework-neutral: conversion targets a plain string map so the same
//! types serve any HTTP frontend. A missing or unparseable required
//! header is a hard reject.

use crate::identity::SignedIdentity;
use authgate_common::AuthError;
use std::collections::HashMap;

/// Header: numeric subject id.
pub const X_AUTH_SUBJECT_ID: &str = "X-Auth-Subject-Id";
/// Header: login principal.
pub const X_AUTH_PRINCIPAL: &str = "X-Auth-Principal";
/// Header: validated access-token id.
pub const X_AUTH_TOKEN_ID: &str = "X-Auth-Token-Id";
/// Header: access-token expiry, unix milliseconds.
pub const X_AUTH_TOKEN_EXPIRY: &str = "X-Auth-Token-Expiry";
/// Header: client IP observed at the edge.
pub const X_AUTH_CLIENT_IP: &str = "X-Auth-Client-Ip";
/// Header: client user agent observed at the edge.
pub const X_AUTH_USER_AGENT: &str = "X-Auth-User-Agent";
/// Header: login location label, when known.
pub const X_AUTH_LOGIN_LOCATION: &str = "X-Auth-Login-Location";
/// Header: base64 identity signature.
pub const X_AUTH_SIGNATURE: &str = "X-Auth-Signature";
/// Header: identity signature timestamp, unix milliseconds.
pub const X_AUTH_SIGNATURE_TIMESTAMP: &str = "X-Auth-Signature-Timestamp";

/// The full identity a request carries from the edge inward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedIdentity {
    /// The signed identity tuple.
    pub identity: SignedIdentity,
    /// Expiry of the validated access token, unix milliseconds.
    pub token_expires_at_millis: i64,
    /// Client IP observed at the edge.
    pub client_ip: String,
    /// Client user agent observed at the edge.
    pub user_agent: String,
    /// Login location label, when known.
    pub login_location: Option<String>,
}

impl ForwardedIdentity {
    /// Render as the header map the edge stamps onto forwarded requests.
    #[must_use]
    pub fn to_header_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(
            X_AUTH_SUBJECT_ID.to_string(),
            self.identity.subject_id.to_string(),
        );
        map.insert(X_AUTH_PRINCIPAL.to_string(), self.identity.principal.clone());
        map.insert(X_AUTH_TOKEN_ID.to_string(), self.identity.token_id.clone());
        map.insert(
            X_AUTH_TOKEN_EXPIRY.to_string(),
            self.token_expires_at_millis.to_string(),
        );
        map.insert(X_AUTH_CLIENT_IP.to_string(), self.client_ip.clone());
        map.insert(X_AUTH_USER_AGENT.to_string(), self.user_agent.clone());
        if let Some(ref location) = self.login_location {
            map.insert(X_AUTH_LOGIN_LOCATION.to_string(), location.clone());
        }
        map.insert(X_AUTH_SIGNATURE.to_string(), self.identity.signature.clone());
        map.insert(
            X_AUTH_SIGNATURE_TIMESTAMP.to_string(),
            self.identity.timestamp_millis.to_string(),
        );
        map
    }

    /// Parse the trust headers off an inbound downstream request.
    ///
    /// # Errors
    ///
    /// [`AuthError::SignatureInvalid`] naming the first missing or
    /// malformed header.
    pub fn from_header_map(headers: &HashMap<String, String>) -> Result<Self, AuthError> {
        let identity = SignedIdentity {
            subject_id: required_i64(headers, X_AUTH_SUBJECT_ID)?,
            principal: required(headers, X_AUTH_PRINCIPAL)?.to_string(),
            token_id: required(headers, X_AUTH_TOKEN_ID)?.to_string(),
            timestamp_millis: required_i64(headers, X_AUTH_SIGNATURE_TIMESTAMP)?,
            signature: required(headers, X_AUTH_SIGNATURE)?.to_string(),
        };

        Ok(Self {
            identity,
            token_expires_at_millis: required_i64(headers, X_AUTH_TOKEN_EXPIRY)?,
            client_ip: required(headers, X_AUTH_CLIENT_IP)?.to_string(),
            user_agent: required(headers, X_AUTH_USER_AGENT)?.to_string(),
            login_location: headers.get(X_AUTH_LOGIN_LOCATION).cloned(),
        })
    }
}

fn required<'a>(headers: &'a HashMap<String, String>, name: &str) -> Result<&'a str, AuthError> {
    headers
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| AuthError::signature(format!("missing header {name}")))
}

fn required_i64(headers: &HashMap<String, String>, name: &str) -> Result<i64, AuthError> {
    required(headers, name)?
        .parse()
        .map_err(|_| AuthError::signature(format!("malformed header {name}")))
}
