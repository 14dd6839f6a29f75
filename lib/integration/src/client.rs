//! Authorized client for the upstream API.
//!
//! A [`SpotifyClient`] is built per request from the session's token and is
//! never stored. Every request carries the token as a bearer credential.

use rootcause::prelude::Report;
use rspotify::model::{PlaylistId as UpstreamPlaylistId, PlaylistItem, PrivateUser, SimplifiedPlaylist};
use rspotify::prelude::*;
use rspotify::{AuthCodeSpotify, Config, Credentials, OAuth, Token};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tagify_core::PlaylistId;
use tagify_platform_access::TokenRecord;
use tracing::instrument;

use crate::error::UpstreamError;
use crate::pagination::collect_all;

/// Default base URL of the upstream Web API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1/";

/// Builds authorized clients bound to the API base URL.
///
/// Cloning is cheap.
#[derive(Debug, Clone)]
pub struct UpstreamClientFactory {
    api_base_url: Arc<str>,
    call_timeout: Duration,
}

impl UpstreamClientFactory {
    /// Creates a factory for the API at `api_base_url`.
    ///
    /// `call_timeout` bounds every upstream call made by the clients it builds.
    #[must_use]
    pub fn new(api_base_url: &str, call_timeout: Duration) -> Self {
        Self {
            api_base_url: Arc::from(format!("{}/", api_base_url.trim_end_matches('/'))),
            call_timeout,
        }
    }

    /// Returns the API base URL, with a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Returns a client acting on behalf of the token's subject.
    ///
    /// The token is not validated or refreshed; an expired or revoked token
    /// shows up as a `401` status on the first call.
    #[must_use]
    pub fn client_for(&self, token: &TokenRecord) -> SpotifyClient {
        let config = Config {
            api_base_url: self.api_base_url.to_string(),
            token_cached: false,
            token_refreshing: false,
            ..Config::default()
        };
        let spotify = AuthCodeSpotify::from_token_with_config(
            upstream_token(token),
            Credentials::default(),
            OAuth::default(),
            config,
        );
        SpotifyClient {
            spotify,
            api_base_url: self.api_base_url.clone(),
            call_timeout: self.call_timeout,
        }
    }
}

fn upstream_token(token: &TokenRecord) -> Token {
    Token {
        access_token: token.access_token().to_string(),
        expires_at: Some(token.expiry()),
        refresh_token: token.refresh_token().map(str::to_string),
        ..Token::default()
    }
}

/// Client for the upstream API, authorized with one user's token.
pub struct SpotifyClient {
    spotify: AuthCodeSpotify,
    api_base_url: Arc<str>,
    call_timeout: Duration,
}

impl SpotifyClient {
    /// Fetches the profile of the token's user.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<PrivateUser, Report<UpstreamError>> {
        let user = tokio::time::timeout(self.call_timeout, self.spotify.current_user())
            .await
            .map_err(|_| UpstreamError::Timeout)?
            .map_err(UpstreamError::from_client)?;
        Ok(user)
    }

    /// Fetches every playlist of the current user, in upstream order.
    #[instrument(skip(self))]
    pub async fn all_playlists(&self) -> Result<Vec<SimplifiedPlaylist>, Report<UpstreamError>> {
        collect_all(self.spotify.current_user_playlists(), self.call_timeout).await
    }

    /// Fetches every item of a playlist, in playlist order.
    #[instrument(skip(self), fields(playlist = %playlist_id))]
    pub async fn all_playlist_items(
        &self,
        playlist_id: &PlaylistId,
    ) -> Result<Vec<PlaylistItem>, Report<UpstreamError>> {
        let upstream_id =
            UpstreamPlaylistId::from_id(playlist_id.as_str()).map_err(|e| {
                UpstreamError::InvalidId {
                    reason: e.to_string(),
                }
            })?;
        collect_all(
            self.spotify.playlist_items(upstream_id, None, None),
            self.call_timeout,
        )
        .await
    }
}

impl fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("api_base_url", &self.api_base_url)
            .field("token", &"[redacted]")
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
