//! OAuth authorization-code client for the upstream accounts service.
//!
//! Built once at startup and shared through [`crate::state::AppState`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, RequestTokenError, Scope, TokenResponse, TokenUrl,
    basic::{BasicClient, BasicTokenType},
};
use tagify_platform_access::{OAuthConfig, TokenRecord};

/// Lifetime assumed for tokens issued without `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Upstream OAuth errors. All of them are reported to the browser as `401`.
#[derive(Debug)]
pub enum SpotifyOAuthError {
    /// Configuration error.
    Configuration(String),
    /// The provider reported an error instead of a code.
    Denied(String),
    /// The callback `state` did not match the one issued at login.
    StateMismatch,
    /// Token exchange failed.
    TokenExchange(String),
}

impl std::fmt::Display for SpotifyOAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Self::Denied(msg) => write!(f, "Authorization denied: {}", msg),
            Self::StateMismatch => write!(f, "OAuth state mismatch"),
            Self::TokenExchange(msg) => write!(f, "Token exchange error: {}", msg),
        }
    }
}

impl std::error::Error for SpotifyOAuthError {}

impl IntoResponse for SpotifyOAuthError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "login callback rejected");
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

/// OAuth client for the upstream provider.
pub struct SpotifyAuthenticator {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    scopes: Vec<Scope>,
    http: reqwest::Client,
}

impl SpotifyAuthenticator {
    /// Creates an authenticator from configuration.
    ///
    /// `http` is used for the token exchange and should not follow redirects.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured URL is invalid.
    pub fn new(config: &OAuthConfig, http: reqwest::Client) -> Result<Self, SpotifyOAuthError> {
        let auth_url = AuthUrl::new(config.auth_url().to_string())
            .map_err(|e| SpotifyOAuthError::Configuration(format!("invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(config.token_url().to_string())
            .map_err(|e| SpotifyOAuthError::Configuration(format!("invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string()).map_err(|e| {
            SpotifyOAuthError::Configuration(format!("invalid redirect URL: {}", e))
        })?;

        Ok(Self {
            client_id: ClientId::new(config.client_id().to_string()),
            client_secret: ClientSecret::new(config.client_secret().to_string()),
            auth_url,
            token_url,
            redirect_url,
            scopes: config
                .scopes()
                .into_iter()
                .map(|s| Scope::new(s.to_string()))
                .collect(),
            http,
        })
    }

    fn client(&self) -> ConfiguredClient {
        BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
    }

    /// Generates the authorization URL and the random `state` embedded in it.
    pub fn authorization_url(&self) -> (String, CsrfToken) {
        let (url, state) = self
            .client()
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.scopes.iter().cloned())
            .url();
        (url.to_string(), state)
    }

    /// Exchanges the authorization code for a token record.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenRecord, SpotifyOAuthError> {
        let response = self
            .client()
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(body) => {
                    SpotifyOAuthError::TokenExchange(body.to_string())
                }
                other => SpotifyOAuthError::TokenExchange(other.to_string()),
            })?;

        let lifetime = response
            .expires_in()
            .and_then(|d| Duration::from_std(d).ok())
            .unwrap_or_else(|| Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECONDS));
        let token_type = match response.token_type() {
            BasicTokenType::Bearer => "Bearer".to_string(),
            BasicTokenType::Mac => "MAC".to_string(),
            BasicTokenType::Extension(other) => other.clone(),
        };

        let mut token = TokenRecord::new(
            response.access_token().secret().clone(),
            token_type,
            Utc::now() + lifetime,
        );
        if let Some(refresh) = response.refresh_token() {
            token = token.with_refresh_token(refresh.secret().clone());
        }
        tracing::info!(expiry = %token.expiry(), "exchanged authorization code");
        Ok(token)
    }
}

impl std::fmt::Debug for SpotifyAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyAuthenticator")
            .field("client_id", &self.client_id.as_str())
            .field("auth_url", &self.auth_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("redirect_url", &self.redirect_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn authenticator(token_url: &str) -> SpotifyAuthenticator {
        let config = OAuthConfig::builder(
            "client-id".to_string(),
            "client-secret".to_string(),
            "http://localhost:8080/auth_redir".to_string(),
        )
        .token_url(token_url.to_string())
        .build();
        SpotifyAuthenticator::new(&config, reqwest::Client::new()).expect("authenticator")
    }

    #[test]
    fn authorization_url_carries_client_and_scope() {
        let auth = authenticator("https://accounts.spotify.com/api/token");
        let (url, state) = auth.authorization_url();
        let url = reqwest::Url::parse(&url).expect("valid url");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(url.as_str().starts_with("https://accounts.spotify.com/authorize"));
        assert!(query.contains(&("client_id".to_string(), "client-id".to_string())));
        assert!(query.contains(&("scope".to_string(), "user-read-private".to_string())));
        assert!(query.contains(&("response_type".to_string(), "code".to_string())));
        assert!(query.contains(&("state".to_string(), state.secret().clone())));
    }

    #[test]
    fn each_authorization_url_has_fresh_state() {
        let auth = authenticator("https://accounts.spotify.com/api/token");
        let (_, first) = auth.authorization_url();
        let (_, second) = auth.authorization_url();
        assert_ne!(first.secret(), second.secret());
    }

    #[test]
    fn invalid_token_url_is_configuration_error() {
        let config = OAuthConfig::builder(
            "client-id".to_string(),
            "client-secret".to_string(),
            "http://localhost:8080/auth_redir".to_string(),
        )
        .token_url("not a url".to_string())
        .build();
        let result = SpotifyAuthenticator::new(&config, reqwest::Client::new());
        assert!(matches!(result, Err(SpotifyOAuthError::Configuration(_))));
    }

    #[tokio::test]
    async fn exchange_builds_token_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("code=the-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "refresh-1",
                "scope": "user-read-private"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let before = Utc::now();
        let token = authenticator(&format!("{}/api/token", server.uri()))
            .exchange_code("the-code")
            .await
            .expect("token");

        assert_eq!(token.access_token(), "access-1");
        assert_eq!(token.token_type(), "Bearer");
        assert_eq!(token.refresh_token(), Some("refresh-1"));
        assert!(token.expiry() >= before + Duration::seconds(3600));
    }

    #[tokio::test]
    async fn missing_expires_in_defaults_to_one_hour() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "token_type": "bearer"
            })))
            .mount(&server)
            .await;

        let before = Utc::now();
        let token = authenticator(&format!("{}/api/token", server.uri()))
            .exchange_code("the-code")
            .await
            .expect("token");
        assert!(token.expiry() >= before + Duration::minutes(59));
        assert!(token.expiry() <= Utc::now() + Duration::minutes(60));
    }

    #[tokio::test]
    async fn rejected_code_is_exchange_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            })))
            .mount(&server)
            .await;

        let result = authenticator(&format!("{}/api/token", server.uri()))
            .exchange_code("bad-code")
            .await;
        match result {
            Err(SpotifyOAuthError::TokenExchange(msg)) => assert!(msg.contains("invalid_grant")),
            other => panic!("expected exchange error, got {other:?}"),
        }
    }

    #[test]
    fn oauth_errors_render_as_unauthorized() {
        let response = SpotifyOAuthError::StateMismatch.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
