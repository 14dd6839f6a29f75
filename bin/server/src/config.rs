//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables (and a `.env`
//! file, if present, loaded by `main`).
//!
//! Top-level keys map directly to variables (`SPOTIFY_ID`,
//! `COOKIE_AUTH_KEY`, ...); nested sections use `__` as separator
//! (`SESSION__SECURE_COOKIES`, `UPSTREAM__API_BASE_URL`, ...).

use serde::Deserialize;
use tagify_integration::client::DEFAULT_API_BASE_URL;
use tagify_platform_access::OAuthConfig;
use tagify_platform_access::oauth::{DEFAULT_AUTH_URL, DEFAULT_TOKEN_URL};

/// Minimum length of the cookie key, in bytes.
pub const MIN_COOKIE_KEY_LEN: usize = 32;

/// Server configuration.
#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    /// OAuth client ID registered with the upstream provider.
    pub spotify_id: String,

    /// OAuth client secret.
    pub spotify_secret: String,

    /// Secret the session cookie encryption key is derived from.
    pub cookie_auth_key: String,

    /// Callback URL registered with the upstream provider.
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,

    /// Address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Upstream endpoints and client behavior.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Page cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Max-age of sessions that carry no token, in minutes.
    /// Tokens last 60 minutes; sessions holding one expire with it.
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

/// Upstream provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the Web API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// OAuth authorize endpoint.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// OAuth token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Timeout for each upstream request, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Page cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Whether rendered pages are cached.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// How long a rendered page is served from cache, in seconds.
    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Most pages held at once.
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

fn default_redirect_url() -> String {
    "http://localhost:8080/auth_redir".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_cookie_name() -> String {
    "tagify_user_session".to_string()
}

fn default_max_age_minutes() -> i64 {
    61
}

fn default_secure_cookies() -> bool {
    true
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl_seconds() -> u64 {
    300
}

fn default_cache_max_entries() -> usize {
    1024
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            max_age_minutes: default_max_age_minutes(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_cache_ttl_seconds(),
            max_entries: default_cache_max_entries(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending variable.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.cookie_auth_key.len() < MIN_COOKIE_KEY_LEN {
            return Err(config::ConfigError::Message(format!(
                "COOKIE_AUTH_KEY must be at least {MIN_COOKIE_KEY_LEN} bytes"
            )));
        }
        if self.spotify_id.is_empty() || self.spotify_secret.is_empty() {
            return Err(config::ConfigError::Message(
                "SPOTIFY_ID and SPOTIFY_SECRET must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the OAuth client configuration.
    #[must_use]
    pub fn oauth(&self) -> OAuthConfig {
        OAuthConfig::builder(
            self.spotify_id.clone(),
            self.spotify_secret.clone(),
            self.redirect_url.clone(),
        )
        .auth_url(self.upstream.auth_url.clone())
        .token_url(self.upstream.token_url.clone())
        .build()
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("spotify_id", &self.spotify_id)
            .field("spotify_secret", &"[redacted]")
            .field("cookie_auth_key", &"[redacted]")
            .field("redirect_url", &self.redirect_url)
            .field("bind_addr", &self.bind_addr)
            .field("session", &self.session)
            .field("upstream", &self.upstream)
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: &str) -> ServerConfig {
        ServerConfig {
            spotify_id: "client-id".to_string(),
            spotify_secret: "client-secret".to_string(),
            cookie_auth_key: key.to_string(),
            redirect_url: default_redirect_url(),
            bind_addr: default_bind_addr(),
            session: SessionConfig::default(),
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "tagify_user_session");
        assert_eq!(config.max_age_minutes, 61);
        assert!(config.secure_cookies);
    }

    #[test]
    fn upstream_config_points_at_spotify() {
        let config = UpstreamConfig::default();
        assert_eq!(config.api_base_url, "https://api.spotify.com/v1/");
        assert_eq!(config.token_url, "https://accounts.spotify.com/api/token");
    }

    #[test]
    fn cache_config_is_bounded_by_default() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl_seconds, 300);
        assert_eq!(config.max_entries, 1024);
    }

    #[test]
    fn short_cookie_key_is_rejected() {
        let config = config_with_key("too-short");
        assert!(config.validate().is_err());
    }

    #[test]
    fn long_cookie_key_is_accepted() {
        let config = config_with_key(&"k".repeat(MIN_COOKIE_KEY_LEN));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn oauth_config_uses_upstream_endpoints() {
        let mut config = config_with_key(&"k".repeat(MIN_COOKIE_KEY_LEN));
        config.upstream.token_url = "http://127.0.0.1:1/api/token".to_string();
        let oauth = config.oauth();
        assert_eq!(oauth.client_id(), "client-id");
        assert_eq!(oauth.token_url(), "http://127.0.0.1:1/api/token");
        assert_eq!(oauth.scopes(), vec!["user-read-private"]);
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = config_with_key("super-secret-cookie-key-material!!");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("client-secret"));
    }
}
