//! # Tokens
//!
//! [`AccessToken`] is the opaque bearer value handed to the client.
//! [`TokenRecord`] pairs a value with its expiry and is the unit persisted
//! by the token store. [`TokenTtl`] converts a configured lifetime into an
//! absolute expiry.
//!
//! ## Persisted Shape
//!
//! Records serialize as `{"token": "<value>", "tokenExpire": <epoch-ms>}`.
//! `tokenExpire` is also accepted as a decimal string on read, since older
//! collections were written by tools that stored it that way.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// An opaque bearer token value.
///
/// Issued values are random v4 UUIDs (122 bits of randomness from the OS
/// generator). Values read back from storage are taken as-is.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Mint a fresh random token value.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a presented value. Rejects empty values and values containing
    /// whitespace, neither of which can arrive in a well-formed header.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidToken(
                "token must be non-empty and contain no whitespace".into(),
            ));
        }
        Ok(Self(value.to_string()))
    }

    /// The raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the raw token string.
    pub fn into_string(self) -> String {
        self.0
    }
}

// Token values are credentials; keep them out of debug logs.
impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "AccessToken({prefix}…)")
    }
}

/// One issued token and the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The token value presented by the client.
    #[serde(rename = "token")]
    pub value: AccessToken,
    /// Expiry in Unix epoch milliseconds. The token is still valid at
    /// exactly this instant.
    #[serde(rename = "tokenExpire", deserialize_with = "deserialize_epoch_millis")]
    pub expires_at_millis: i64,
}

impl TokenRecord {
    /// Create a record.
    pub fn new(value: AccessToken, expires_at_millis: i64) -> Self {
        Self {
            value,
            expires_at_millis,
        }
    }

    /// Whether the token is valid at `now_millis` (inclusive boundary).
    pub fn is_live_at(&self, now_millis: i64) -> bool {
        self.expires_at_millis >= now_millis
    }
}

fn deserialize_epoch_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Millis::deserialize(deserializer)? {
        Millis::Int(v) => Ok(v),
        Millis::Float(v) if v.is_finite() => Ok(v.trunc() as i64),
        Millis::Float(v) => Err(serde::de::Error::custom(format!(
            "tokenExpire is not a finite number: {v}"
        ))),
        Millis::Text(s) => s.trim().parse::<i64>().map_err(|e| {
            serde::de::Error::custom(format!("tokenExpire {s:?} is not an integer: {e}"))
        }),
    }
}

/// Lifetime of an issued token, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenTtl(u64);

impl TokenTtl {
    /// Create a TTL. Zero is rejected: such a token would expire on issue.
    pub fn from_secs(secs: u64) -> Result<Self, CoreError> {
        if secs == 0 {
            return Err(CoreError::ZeroTtl);
        }
        Ok(Self(secs))
    }

    /// The lifetime in seconds, as reported in `expiresIn`.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Absolute expiry for a token issued at `now_millis`.
    pub fn expires_at(&self, now_millis: i64) -> i64 {
        let ttl_millis = i64::try_from(self.0.saturating_mul(1000)).unwrap_or(i64::MAX);
        now_millis.saturating_add(ttl_millis)
    }
}
