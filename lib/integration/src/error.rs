//! Error types for the integration crate.
//!
//! Every variant is terminal for the request that hit it; nothing retries.

use rspotify::ClientError;
use rspotify::http::HttpError;
use std::fmt;

/// Errors from calls to the upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The request could not be sent or the response not read.
    Request { reason: String },
    /// The request timed out.
    Timeout,
    /// The upstream answered with a non-success status.
    Status { status: u16 },
    /// The response body did not match the expected resource.
    Decode { reason: String },
    /// The ID could not be turned into an upstream ID.
    InvalidId { reason: String },
}

impl UpstreamError {
    /// Classifies an error returned by the upstream client.
    #[must_use]
    pub fn from_client(err: ClientError) -> Self {
        match err {
            ClientError::Http(http) => match *http {
                HttpError::StatusCode(response) => Self::Status {
                    status: response.status().as_u16(),
                },
                HttpError::Client(e) if e.is_timeout() => Self::Timeout,
                other => Self::Request {
                    reason: other.to_string(),
                },
            },
            ClientError::ParseJson(e) => Self::Decode {
                reason: e.to_string(),
            },
            other => Self::Request {
                reason: other.to_string(),
            },
        }
    }
}

impl From<ClientError> for UpstreamError {
    fn from(err: ClientError) -> Self {
        Self::from_client(err)
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { reason } => {
                write!(f, "upstream request failed: {reason}")
            }
            Self::Timeout => write!(f, "upstream request timed out"),
            Self::Status { status } => {
                write!(f, "upstream responded with status {status}")
            }
            Self::Decode { reason } => {
                write!(f, "failed to decode upstream response: {reason}")
            }
            Self::InvalidId { reason } => write!(f, "invalid upstream id: {reason}"),
        }
    }
}

impl std::error::Error for UpstreamError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = UpstreamError::Status { status: 401 };
        assert_eq!(err.to_string(), "upstream responded with status 401");
    }

    #[test]
    fn json_errors_are_decode_errors() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = UpstreamError::from(ClientError::from(json_err));
        assert!(matches!(err, UpstreamError::Decode { .. }));
    }

    #[test]
    fn invalid_token_is_request_error() {
        let err = UpstreamError::from(ClientError::InvalidToken);
        assert!(matches!(err, UpstreamError::Request { .. }));
    }
}
