//! HTML and JSON rendering of upstream resources.
//!
//! Templates are compiled into the binary and registered once at startup.

use axum::{
    Json,
    response::{Html, IntoResponse, Response},
};
use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;
use serde_json::json;
use tagify_integration::Id;
use tagify_integration::model::{PlayableItem, PlaylistItem, PrivateUser, SimplifiedPlaylist};

use crate::error::AppError;

const HOME_TEMPLATE: &str = "home";
const PLAYLISTS_TEMPLATE: &str = "playlists";
const PLAYLIST_TEMPLATE: &str = "playlist";

const JSON_SUFFIX: &str = ".json";

/// Output format of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html,
    Json,
}

impl Format {
    /// Splits a `.json` suffix, in any case, off a path segment.
    #[must_use]
    pub fn split_suffix(segment: &str) -> (&str, Self) {
        let split = segment
            .len()
            .checked_sub(JSON_SUFFIX.len())
            .filter(|&at| segment.is_char_boundary(at))
            .map(|at| segment.split_at(at));
        match split {
            Some((stem, suffix)) if suffix.eq_ignore_ascii_case(JSON_SUFFIX) => (stem, Self::Json),
            _ => (segment, Self::Html),
        }
    }
}

/// Renders pages from the compiled-in templates.
pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    /// Registers all templates.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to parse.
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_template_string(HOME_TEMPLATE, include_str!("../templates/home.hbs"))?;
        registry.register_template_string(
            PLAYLISTS_TEMPLATE,
            include_str!("../templates/playlists.hbs"),
        )?;
        registry.register_template_string(
            PLAYLIST_TEMPLATE,
            include_str!("../templates/playlist.hbs"),
        )?;
        Ok(Self { registry })
    }

    fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<Html<String>, RenderError> {
        self.registry.render(template, data).map(Html)
    }

    /// Renders the current user's profile.
    pub fn home(&self, user: &PrivateUser, format: Format) -> Result<Response, AppError> {
        match format {
            Format::Json => Ok(Json(json!({ "currentUser": user })).into_response()),
            Format::Html => {
                let view = HomeView {
                    name: user.display_name.as_deref().unwrap_or(user.id.id()),
                    id: user.id.id(),
                    email: user.email.as_deref(),
                    profile_url: user.external_urls.get("spotify").map(String::as_str),
                };
                Ok(self.render(HOME_TEMPLATE, &view)?.into_response())
            }
        }
    }

    /// Renders the current user's playlists.
    pub fn playlists(
        &self,
        playlists: &[SimplifiedPlaylist],
        format: Format,
    ) -> Result<Response, AppError> {
        match format {
            Format::Json => Ok(Json(json!({ "playlists": playlists })).into_response()),
            Format::Html => {
                let view = PlaylistsView {
                    count: playlists.len(),
                    playlists: playlists
                        .iter()
                        .map(|p| PlaylistRow {
                            id: p.id.id(),
                            name: &p.name,
                            owner: p.owner.display_name.as_deref().unwrap_or(p.owner.id.id()),
                            track_count: p.tracks.total,
                        })
                        .collect(),
                };
                Ok(self.render(PLAYLISTS_TEMPLATE, &view)?.into_response())
            }
        }
    }

    /// Renders the items of one playlist.
    pub fn playlist(
        &self,
        playlist_id: &str,
        items: &[PlaylistItem],
        format: Format,
    ) -> Result<Response, AppError> {
        match format {
            Format::Json => Ok(Json(json!({ "tracks": items })).into_response()),
            Format::Html => {
                let view = PlaylistView {
                    id: playlist_id,
                    count: items.len(),
                    tracks: items
                        .iter()
                        .filter_map(|item| item.track.as_ref())
                        .map(TrackRow::from_playable)
                        .collect(),
                };
                Ok(self.render(PLAYLIST_TEMPLATE, &view)?.into_response())
            }
        }
    }
}

#[derive(Serialize)]
struct HomeView<'a> {
    name: &'a str,
    id: &'a str,
    email: Option<&'a str>,
    profile_url: Option<&'a str>,
}

#[derive(Serialize)]
struct PlaylistsView<'a> {
    count: usize,
    playlists: Vec<PlaylistRow<'a>>,
}

#[derive(Serialize)]
struct PlaylistRow<'a> {
    id: &'a str,
    name: &'a str,
    owner: &'a str,
    track_count: u32,
}

#[derive(Serialize)]
struct PlaylistView<'a> {
    id: &'a str,
    count: usize,
    tracks: Vec<TrackRow<'a>>,
}

#[derive(Serialize)]
struct TrackRow<'a> {
    name: &'a str,
    artists: String,
    album: Option<&'a str>,
    duration: String,
}

impl<'a> TrackRow<'a> {
    fn from_playable(item: &'a PlayableItem) -> Self {
        match item {
            PlayableItem::Track(track) => Self {
                name: &track.name,
                artists: track
                    .artists
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                album: Some(&track.album.name),
                duration: format_duration(track.duration.num_milliseconds()),
            },
            // Episodes are credited to their show.
            PlayableItem::Episode(episode) => Self {
                name: &episode.name,
                artists: episode.show.name.clone(),
                album: None,
                duration: format_duration(episode.duration.num_milliseconds()),
            },
        }
    }
}

fn format_duration(duration_ms: i64) -> String {
    let total_seconds = duration_ms.max(0) / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
