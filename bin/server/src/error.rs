//! Domain error types for request handling and the centralized error layer.
//!
//! Handlers return [`AppError`]. Most variants do not render a response of
//! their own: they attach a [`RecordedErrors`] extension to a bare `500`,
//! and [`handle_errors`], running outermost, logs every recorded error and
//! replaces the response with a generic body.

use axum::{
    Json,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use rootcause::prelude::Report;
use std::fmt;
use tagify_core::ParseIdError;
use tagify_integration::UpstreamError;
use tagify_platform_access::{AuthError, TokenCodecError};

/// Errors raised while serving a page.
#[derive(Debug)]
pub enum AppError {
    /// No usable token in the session of an ungated handler.
    Auth(AuthError),
    /// The token could not be encoded into the session.
    TokenCodec(TokenCodecError),
    /// A call to the upstream API failed.
    Upstream(Report<UpstreamError>),
    /// The requested playlist ID is malformed.
    InvalidPlaylistId(ParseIdError),
    /// A template failed to render.
    Render { reason: String },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth(e) => write!(f, "no usable token in session: {e}"),
            Self::TokenCodec(e) => write!(f, "failed to store token: {e}"),
            Self::Upstream(report) => write!(f, "upstream call failed: {report}"),
            Self::InvalidPlaylistId(e) => write!(f, "{e}"),
            Self::Render { reason } => write!(f, "failed to render page: {reason}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<TokenCodecError> for AppError {
    fn from(e: TokenCodecError) -> Self {
        Self::TokenCodec(e)
    }
}

impl From<Report<UpstreamError>> for AppError {
    fn from(report: Report<UpstreamError>) -> Self {
        Self::Upstream(report)
    }
}

impl From<ParseIdError> for AppError {
    fn from(e: ParseIdError) -> Self {
        Self::InvalidPlaylistId(e)
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(e: handlebars::RenderError) -> Self {
        Self::Render {
            reason: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::InvalidPlaylistId(e) = &self {
            tracing::debug!(error = %e, "rejecting malformed playlist id");
            return (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": e.to_string()})))
                .into_response();
        }

        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        record_error(&mut response, self.to_string());
        response
    }
}

/// Errors attached to a response for the error layer to log.
#[derive(Debug, Clone, Default)]
pub struct RecordedErrors(pub Vec<String>);

/// Attaches `message` to `response` for the error layer.
pub fn record_error(response: &mut Response, message: String) {
    match response.extensions_mut().get_mut::<RecordedErrors>() {
        Some(RecordedErrors(errors)) => errors.push(message),
        None => {
            response
                .extensions_mut()
                .insert(RecordedErrors(vec![message]));
        }
    }
}

/// Logs recorded errors and replaces the response with a generic `500`.
///
/// The replacement happens whatever status the inner handler produced.
pub async fn handle_errors(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;

    let Some(RecordedErrors(errors)) = response.extensions().get::<RecordedErrors>() else {
        return response;
    };
    for error in errors {
        tracing::error!(%method, %uri, error = %error, "request failed");
    }

    (StatusCode::INTERNAL_SERVER_ERROR, Json("")).into_response()
}
