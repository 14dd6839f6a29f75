//! Profile page of the logged-in user.

use axum::{extract::State, response::Response};
use tagify_platform_access::TokenRecord;

use crate::auth::RequireToken;
use crate::error::AppError;
use crate::render::Format;
use crate::state::AppState;

/// Renders the current user's profile as HTML.
pub async fn home(
    State(state): State<AppState>,
    RequireToken(token): RequireToken,
) -> Result<Response, AppError> {
    render_home(&state, &token, Format::Html).await
}

/// Renders the current user's profile as JSON.
pub async fn home_json(
    State(state): State<AppState>,
    RequireToken(token): RequireToken,
) -> Result<Response, AppError> {
    render_home(&state, &token, Format::Json).await
}

async fn render_home(
    state: &AppState,
    token: &TokenRecord,
    format: Format,
) -> Result<Response, AppError> {
    let user = state.upstream.client_for(token).current_user().await?;
    state.renderer.home(&user, format)
}
