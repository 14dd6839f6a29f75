//! Page handlers for the application.
//!
//! Each page fetches what it needs from the upstream API with the session's
//! token and renders it as HTML, or as JSON when the path ends in `.json`.

pub mod home;
pub mod playlists;

pub use home::{home, home_json};
pub use playlists::{playlist, playlists, playlists_json};

/// Liveness endpoint.
pub async fn root() -> &'static str {
    "ok"
}
