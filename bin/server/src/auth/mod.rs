//! Authentication module for the tagify server.
//!
//! This module provides:
//! - The OAuth authorization-code flow against the upstream accounts service
//! - Login, callback and logout routes
//! - The short-lived cookie carrying the pending OAuth `state`
//! - The [`RequireToken`] extractor gating pages that need a token
//!
//! The token itself lives in the cookie session; see
//! [`tagify_platform_access::auth`] for the session-side operations.

pub mod login_state;
pub mod middleware;
pub mod routes;
pub mod spotify;

pub use middleware::{AuthRejection, RequireToken};
pub use routes::{auth_redirect, login, logout};
pub use spotify::{SpotifyAuthenticator, SpotifyOAuthError};
