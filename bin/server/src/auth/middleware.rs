//! Authentication extractors for Axum.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tagify_platform_access::{TokenRecord, auth};

use crate::session::CookieSession;
use crate::state::AppState;

/// Extractor for requiring a token in the session.
///
/// If there is none, the request is redirected to the login page and the
/// handler never runs.
pub struct RequireToken(pub TokenRecord);

impl FromRequestParts<AppState> for RequireToken {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = CookieSession::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});

        match auth::get_token(session.session()) {
            Ok(token) => {
                if auth::token_expired_at(&token, chrono::Utc::now()) {
                    tracing::debug!(expiry = %token.expiry(), "using expired token");
                }
                Ok(RequireToken(token))
            }
            Err(e) => {
                tracing::debug!(reason = %e, path = %parts.uri.path(), "not logged in");
                Err(AuthRejection::NotAuthenticated)
            }
        }
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => Redirect::temporary("/login").into_response(),
        }
    }
}
