//! Playlist listing and playlist contents.

use axum::{
    extract::{Path, State},
    response::Response,
};
use tagify_core::PlaylistId;
use tagify_platform_access::{TokenRecord, auth};

use crate::auth::RequireToken;
use crate::error::AppError;
use crate::render::Format;
use crate::session::CookieSession;
use crate::state::AppState;

/// Renders all of the current user's playlists as HTML.
pub async fn playlists(
    State(state): State<AppState>,
    RequireToken(token): RequireToken,
) -> Result<Response, AppError> {
    render_playlists(&state, &token, Format::Html).await
}

/// Renders all of the current user's playlists as JSON.
pub async fn playlists_json(
    State(state): State<AppState>,
    RequireToken(token): RequireToken,
) -> Result<Response, AppError> {
    render_playlists(&state, &token, Format::Json).await
}

async fn render_playlists(
    state: &AppState,
    token: &TokenRecord,
    format: Format,
) -> Result<Response, AppError> {
    let all = state.upstream.client_for(token).all_playlists().await?;
    state.renderer.playlists(&all, format)
}

/// Renders every item of one playlist.
///
/// Not gated: without a token in the session this fails with a `500`.
pub async fn playlist(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    session: CookieSession,
) -> Result<Response, AppError> {
    let (raw_id, format) = Format::split_suffix(&segment);
    let playlist_id: PlaylistId = raw_id.parse()?;
    let token = auth::get_token(session.session())?;

    let items = state
        .upstream
        .client_for(&token)
        .all_playlist_items(&playlist_id)
        .await?;
    tracing::debug!(playlist = %playlist_id, items = items.len(), "fetched playlist");
    state.renderer.playlist(playlist_id.as_str(), &items, format)
}
