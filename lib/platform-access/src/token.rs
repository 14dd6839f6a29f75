//! OAuth token record and its session transport encoding.
//!
//! The record is stored in the session as a JSON string. The field names
//! match the common OAuth token JSON shape (`access_token`, `token_type`,
//! `refresh_token`, `expiry`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use std::fmt;

use crate::error::TokenCodecError;

/// Credentials granted by the upstream provider.
///
/// A record found in a session means the provider granted access at some
/// point. Expiry is not re-checked before use; an expired token surfaces as
/// an upstream failure.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    access_token: String,
    token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    expiry: DateTime<Utc>,
}

impl TokenRecord {
    /// Creates a token record without a refresh token.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expiry: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            refresh_token: None,
            expiry,
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the token type (usually `Bearer`).
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Returns the refresh token, if one was granted.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Returns when the access token expires.
    #[must_use]
    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    /// Encodes the record for storage in a session value.
    ///
    /// # Errors
    ///
    /// Returns `TokenCodecError::Encoding` if serialization fails.
    pub fn encode(&self) -> Result<String, TokenCodecError> {
        serde_json::to_string(self).map_err(|e| TokenCodecError::Encoding {
            reason: e.to_string(),
        })
    }

    /// Decodes a record previously produced by [`TokenRecord::encode`].
    ///
    /// # Errors
    ///
    /// Returns `TokenCodecError::Decoding` if the input is not valid JSON and
    /// `TokenCodecError::Shape` if it is JSON but not a token record.
    pub fn decode(encoded: &str) -> Result<Self, TokenCodecError> {
        serde_json::from_str(encoded).map_err(|e| match e.classify() {
            Category::Data => TokenCodecError::Shape {
                reason: e.to_string(),
            },
            Category::Io | Category::Syntax | Category::Eof => TokenCodecError::Decoding {
                reason: e.to_string(),
            },
        })
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"[redacted]")
            .field("token_type", &self.token_type)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("expiry", &self.expiry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> TokenRecord {
        TokenRecord::new(
            "BQDaccess",
            "Bearer",
            Utc.with_ymd_and_hms(2026, 10, 19, 12, 30, 0).unwrap(),
        )
        .with_refresh_token("AQCrefresh")
    }

    #[test]
    fn roundtrip_preserves_all_fields() {
        let token = sample();
        let encoded = token.encode().expect("encode");
        let decoded = TokenRecord::decode(&encoded).expect("decode");
        assert_eq!(decoded, token);
        assert_eq!(decoded.refresh_token(), Some("AQCrefresh"));
    }

    #[test]
    fn roundtrip_without_refresh_token() {
        let token = TokenRecord::new("a", "Bearer", Utc::now());
        let decoded = TokenRecord::decode(&token.encode().expect("encode")).expect("decode");
        assert_eq!(decoded, token);
        assert!(decoded.refresh_token().is_none());
    }

    #[test]
    fn roundtrip_keeps_subsecond_expiry() {
        let expiry = Utc.timestamp_opt(1_790_000_000, 123_456_789).unwrap();
        let token = TokenRecord::new("a", "Bearer", expiry);
        let decoded = TokenRecord::decode(&token.encode().expect("encode")).expect("decode");
        assert_eq!(decoded.expiry(), expiry);
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let err = TokenRecord::decode("{not json").unwrap_err();
        assert!(matches!(err, TokenCodecError::Decoding { .. }));
    }

    #[test]
    fn decode_rejects_truncated_input() {
        let err = TokenRecord::decode("").unwrap_err();
        assert!(matches!(err, TokenCodecError::Decoding { .. }));
    }

    #[test]
    fn decode_reports_wrong_shape() {
        let err = TokenRecord::decode(r#"{"access_token": "a", "token_type": "Bearer"}"#)
            .unwrap_err();
        assert!(matches!(err, TokenCodecError::Shape { .. }));

        let err = TokenRecord::decode("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, TokenCodecError::Shape { .. }));
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("BQDaccess"));
        assert!(!rendered.contains("AQCrefresh"));
        assert!(rendered.contains("Bearer"));
    }
}
