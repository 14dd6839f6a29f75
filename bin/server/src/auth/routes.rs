//! Authentication routes for login, callback, and logout.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;
use tagify_platform_access::auth;

use super::{SpotifyOAuthError, login_state};
use crate::error::AppError;
use crate::session::CookieSession;
use crate::state::AppState;

/// Query parameters for the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Redirects to the provider's authorize URL, or home if already logged in.
pub async fn login(
    State(state): State<AppState>,
    session: CookieSession,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    if auth::is_logged_in(session.session()) {
        return (jar, Redirect::temporary("/home"));
    }

    let (auth_url, csrf_state) = state.authenticator.authorization_url();
    let jar = login_state::issue(
        jar,
        csrf_state.secret(),
        state.session_config.secure_cookies,
    );
    tracing::debug!("redirecting to authorize URL");
    (jar, Redirect::temporary(&auth_url))
}

/// Handles the OAuth callback after the user authorizes with the provider.
///
/// The pending `state` cookie is cleared even when the callback fails.
pub async fn auth_redirect(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    mut session: CookieSession,
    jar: PrivateCookieJar,
) -> Response {
    let (jar, state_ok) = login_state::take(jar, query.state.as_deref());
    match complete_login(&state, query, state_ok, &mut session).await {
        Ok(()) => (jar, session, Redirect::temporary("/home")).into_response(),
        Err(CallbackError::OAuth(e)) => (jar, e).into_response(),
        Err(CallbackError::App(e)) => (jar, e).into_response(),
    }
}

enum CallbackError {
    OAuth(SpotifyOAuthError),
    App(AppError),
}

impl From<SpotifyOAuthError> for CallbackError {
    fn from(e: SpotifyOAuthError) -> Self {
        Self::OAuth(e)
    }
}

impl From<AppError> for CallbackError {
    fn from(e: AppError) -> Self {
        Self::App(e)
    }
}

async fn complete_login(
    state: &AppState,
    query: CallbackQuery,
    state_ok: bool,
    session: &mut CookieSession,
) -> Result<(), CallbackError> {
    if let Some(error) = query.error {
        return Err(SpotifyOAuthError::Denied(error).into());
    }
    if !state_ok {
        return Err(SpotifyOAuthError::StateMismatch.into());
    }
    let code = query.code.ok_or_else(|| {
        SpotifyOAuthError::TokenExchange("callback carried no authorization code".to_string())
    })?;

    let token = state.authenticator.exchange_code(&code).await?;
    auth::store_token(session.session_mut(), &token).map_err(AppError::from)?;
    Ok(())
}

/// Logs out the user by clearing the session.
pub async fn logout(mut session: CookieSession) -> (CookieSession, Redirect) {
    if auth::is_logged_in(session.session()) {
        auth::logout(session.session_mut());
        tracing::debug!("logged out");
    }
    (session, Redirect::temporary("/"))
}
