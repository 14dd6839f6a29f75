//! Shared application state, built once at startup and injected into handlers.

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tagify_integration::UpstreamClientFactory;

use crate::auth::SpotifyAuthenticator;
use crate::cache::PageCache;
use crate::config::{MIN_COOKIE_KEY_LEN, ServerConfig, SessionConfig};
use crate::render::Renderer;

/// Errors that prevent the application from starting.
#[derive(Debug)]
pub enum StartupError {
    /// The cookie key is too short to derive an encryption key from.
    CookieKey { len: usize },
    /// The OAuth HTTP client could not be built.
    HttpClient { reason: String },
    /// The OAuth client configuration is invalid.
    Authenticator { reason: String },
    /// A compiled-in template failed to parse.
    Templates { reason: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CookieKey { len } => write!(
                f,
                "cookie key is {len} bytes, need at least {MIN_COOKIE_KEY_LEN}"
            ),
            Self::HttpClient { reason } => write!(f, "failed to build HTTP client: {reason}"),
            Self::Authenticator { reason } => {
                write!(f, "invalid OAuth configuration: {reason}")
            }
            Self::Templates { reason } => write!(f, "failed to load templates: {reason}"),
        }
    }
}

impl std::error::Error for StartupError {}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// OAuth authenticator for the upstream provider.
    pub authenticator: Arc<SpotifyAuthenticator>,
    /// Builds per-request upstream clients.
    pub upstream: UpstreamClientFactory,
    /// Session cookie configuration.
    pub session_config: Arc<SessionConfig>,
    /// HTML renderer.
    pub renderer: Arc<Renderer>,
    /// Rendered page cache; `None` when disabled.
    pub page_cache: Option<Arc<PageCache>>,
    cookie_key: Key,
}

impl AppState {
    /// Creates the application state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie key is too short, the OAuth client
    /// cannot be built, or a template fails to parse.
    pub fn new(config: &ServerConfig) -> tagify_core::Result<Self, StartupError> {
        let key_len = config.cookie_auth_key.len();
        if key_len < MIN_COOKIE_KEY_LEN {
            return Err(StartupError::CookieKey { len: key_len }.into());
        }
        let cookie_key = Key::derive_from(config.cookie_auth_key.as_bytes());

        let call_timeout = Duration::from_secs(config.upstream.timeout_seconds);

        // The token endpoint must not be allowed to redirect the code elsewhere.
        let oauth_http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(call_timeout)
            .build()
            .map_err(|e| StartupError::HttpClient {
                reason: e.to_string(),
            })?;

        let authenticator =
            SpotifyAuthenticator::new(&config.oauth(), oauth_http).map_err(|e| {
                StartupError::Authenticator {
                    reason: e.to_string(),
                }
            })?;

        let renderer = Renderer::new().map_err(|e| StartupError::Templates {
            reason: e.to_string(),
        })?;

        let page_cache = config.cache.enabled.then(|| {
            Arc::new(PageCache::new(
                Duration::from_secs(config.cache.ttl_seconds),
                config.cache.max_entries,
                config.session.cookie_name.clone(),
            ))
        });

        Ok(Self {
            authenticator: Arc::new(authenticator),
            upstream: UpstreamClientFactory::new(&config.upstream.api_base_url, call_timeout),
            session_config: Arc::new(config.session.clone()),
            renderer: Arc::new(renderer),
            page_cache,
            cookie_key,
        })
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
