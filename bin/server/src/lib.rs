//! tagify web server.
//!
//! Logs a user in to Spotify with the OAuth authorization-code flow, keeps
//! the token in an encrypted cookie session, and renders the user's profile
//! and playlists as HTML or JSON.

pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod pages;
pub mod render;
pub mod session;
pub mod state;

pub use app::router;
pub use config::ServerConfig;
pub use state::AppState;
