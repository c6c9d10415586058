//! # Client Credential
//!
//! The single trusted `(clientId, secret)` pair that may exchange itself for
//! an access token. The credential is supplied through configuration and is
//! never persisted.
//!
//! ## Security Invariant
//!
//! Both fields are compared in constant time and both comparisons always
//! run, so neither response timing nor the response itself reveals which
//! field was wrong.

use subtle::{Choice, ConstantTimeEq};

use crate::error::CoreError;

/// The trusted client identity and its shared secret.
///
/// Custom `Debug` redacts the secret to prevent credential leakage in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredential {
    client_id: String,
    secret: String,
}

impl ClientCredential {
    /// Build a credential, rejecting empty fields.
    pub fn new(client_id: impl Into<String>, secret: impl Into<String>) -> Result<Self, CoreError> {
        let client_id = client_id.into();
        let secret = secret.into();
        if client_id.is_empty() {
            return Err(CoreError::EmptyClientId);
        }
        if secret.is_empty() {
            return Err(CoreError::EmptySecret);
        }
        Ok(Self { client_id, secret })
    }

    /// The configured client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Whether the presented pair equals this credential exactly.
    pub fn matches(&self, client_id: &str, secret: &str) -> bool {
        let id_ok = ct_str_eq(client_id, &self.client_id);
        let secret_ok = ct_str_eq(secret, &self.secret);
        (id_ok & secret_ok).into()
    }
}

impl std::fmt::Debug for ClientCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredential")
            .field("client_id", &self.client_id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Constant-time string equality.
///
/// When lengths differ, performs a dummy comparison so the length mismatch
/// path costs roughly the same as a full comparison.
fn ct_str_eq(provided: &str, expected: &str) -> Choice {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return Choice::from(0);
    }
    provided.ct_eq(expected)
}
