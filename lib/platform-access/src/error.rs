//! Error types for the platform-access crate.
//!
//! - `TokenCodecError`: Failures encoding or decoding a token record
//! - `AuthError`: Reasons a session does not yield a usable token

use std::fmt;

/// Errors from encoding or decoding a token record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCodecError {
    /// The record could not be serialized.
    Encoding { reason: String },
    /// The input is not a valid encoding.
    Decoding { reason: String },
    /// The input decoded, but its shape does not match a token record.
    Shape { reason: String },
}

impl fmt::Display for TokenCodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding { reason } => {
                write!(f, "failed to encode token: {reason}")
            }
            Self::Decoding { reason } => {
                write!(f, "failed to decode token: {reason}")
            }
            Self::Shape { reason } => {
                write!(f, "decoded token has unexpected shape: {reason}")
            }
        }
    }
}

impl std::error::Error for TokenCodecError {}

/// Errors from reading a token out of a session.
///
/// Every variant means "not logged in"; none of them is surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No value is stored under the token key.
    NotFound { key: String },
    /// The value under the token key is not a string.
    TypeMismatch { key: String, found: String },
    /// The stored string is not a valid token encoding.
    Decoding { source: TokenCodecError },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { key } => {
                write!(f, "no token found under session key {key:?}")
            }
            Self::TypeMismatch { key, found } => {
                write!(
                    f,
                    "expected a string under session key {key:?}, found {found}"
                )
            }
            Self::Decoding { source } => {
                write!(f, "stored token is unusable: {source}")
            }
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decoding { source } => Some(source),
            _ => None,
        }
    }
}

impl From<TokenCodecError> for AuthError {
    fn from(source: TokenCodecError) -> Self {
        Self::Decoding { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_error_display() {
        let err = TokenCodecError::Shape {
            reason: "missing field `expiry`".to_string(),
        };
        assert!(err.to_string().contains("unexpected shape"));
        assert!(err.to_string().contains("expiry"));
    }

    #[test]
    fn auth_error_not_found_display() {
        let err = AuthError::NotFound {
            key: "spotify-token".to_string(),
        };
        assert!(err.to_string().contains("spotify-token"));
    }

    #[test]
    fn auth_error_type_mismatch_display() {
        let err = AuthError::TypeMismatch {
            key: "spotify-token".to_string(),
            found: "number".to_string(),
        };
        assert!(err.to_string().contains("expected a string"));
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn auth_error_wraps_codec_error() {
        let err: AuthError = TokenCodecError::Decoding {
            reason: "EOF".to_string(),
        }
        .into();
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("unusable"));
    }
}
