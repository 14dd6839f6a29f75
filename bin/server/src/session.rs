//! Cookie-backed session store.
//!
//! The whole session payload lives in one private (encrypted and
//! authenticated) cookie. [`CookieSession`] loads it at extraction time and
//! writes it back when returned as part of a response, but only if the
//! session was modified.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponseParts, ResponseParts},
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use chrono::{Duration, Utc};
use std::convert::Infallible;
use std::sync::Arc;
use tagify_platform_access::{Session, SessionPayload};

use crate::config::SessionConfig;
use crate::state::AppState;

/// The request's session, bound to its cookie jar.
pub struct CookieSession {
    jar: PrivateCookieJar,
    session: Session,
    config: Arc<SessionConfig>,
}

impl CookieSession {
    /// Returns the session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the session for mutation.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Writes the session back into the cookie jar.
    ///
    /// An unmodified session leaves the jar untouched. An invalidated or
    /// already-expired session removes the cookie.
    #[must_use]
    pub fn commit(self) -> PrivateCookieJar {
        let Self {
            jar,
            session,
            config,
        } = self;
        if !session.is_modified() {
            return jar;
        }

        let now = Utc::now();
        let default_max_age = Duration::minutes(config.max_age_minutes);
        let max_age = session.max_age_at(now).unwrap_or(default_max_age);
        if session.is_invalidated() || max_age <= Duration::zero() {
            tracing::debug!("removing session cookie");
            return jar.remove(Cookie::build((config.cookie_name.clone(), "")).path("/"));
        }

        let mut payload = session.to_payload();
        payload.expires_at.get_or_insert(now + max_age);
        let value = match serde_json::to_string(&payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode session payload");
                return jar;
            }
        };

        let cookie = Cookie::build((config.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(config.secure_cookies)
            .same_site(SameSite::Strict)
            .max_age(time::Duration::seconds(max_age.num_seconds()));
        jar.add(cookie)
    }
}

impl FromRequestParts<AppState> for CookieSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar<Key> = PrivateCookieJar::from_request_parts(parts, state).await?;
        let config = state.session_config.clone();

        // A cookie that fails to decrypt is absent from the private jar.
        let session = jar
            .get(&config.cookie_name)
            .and_then(
                |cookie| match serde_json::from_str::<SessionPayload>(cookie.value()) {
                    Ok(payload) => Some(payload),
                    Err(e) => {
                        tracing::debug!(error = %e, "ignoring malformed session payload");
                        None
                    }
                },
            )
            .map(|payload| Session::from_payload(payload, Utc::now()))
            .unwrap_or_default();

        Ok(Self {
            jar,
            session,
            config,
        })
    }
}

impl IntoResponseParts for CookieSession {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.commit().into_response_parts(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        extract::Request,
        http::{HeaderMap, StatusCode, header},
        routing::get,
    };
    use tower::ServiceExt;

    use crate::config::{CacheConfig, ServerConfig, UpstreamConfig};

    fn state() -> AppState {
        let config = ServerConfig {
            spotify_id: "client-id".to_string(),
            spotify_secret: "client-secret".to_string(),
            cookie_auth_key: "a-cookie-key-that-is-long-enough-to-derive-from".to_string(),
            redirect_url: "http://localhost:8080/auth_redir".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            session: SessionConfig {
                secure_cookies: false,
                ..SessionConfig::default()
            },
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
        };
        AppState::new(&config).expect("state")
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/count",
                get(|mut session: CookieSession| async move {
                    let count = session
                        .session()
                        .get("count")
                        .and_then(serde_json::Value::as_i64)
                        .unwrap_or(0)
                        + 1;
                    session.session_mut().set("count", count);
                    (session, count.to_string())
                }),
            )
            .route(
                "/peek",
                get(|session: CookieSession| async move {
                    let count = session.session().get("count").cloned();
                    (session, format!("{count:?}"))
                }),
            )
            .route(
                "/destroy",
                get(|mut session: CookieSession| async move {
                    session.session_mut().set_max_age(Duration::seconds(-1));
                    (session, StatusCode::OK)
                }),
            )
            .with_state(state())
    }

    async fn get_with_cookie(path: &str, cookie: Option<&str>) -> (HeaderMap, String) {
        let mut request = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = app()
            .oneshot(request.body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (headers, String::from_utf8(bytes.to_vec()).expect("utf-8"))
    }

    fn session_cookie(headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("tagify_user_session="))
            .map(str::to_string)
    }

    fn name_value(set_cookie: &str) -> String {
        set_cookie
            .split(';')
            .next()
            .expect("name=value")
            .to_string()
    }

    #[tokio::test]
    async fn modified_session_sets_hardened_cookie() {
        let (headers, body) = get_with_cookie("/count", None).await;
        assert_eq!(body, "1");
        let cookie = session_cookie(&headers).expect("session cookie");
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains(&format!("Max-Age={}", 61 * 60)));
        assert!(!cookie.contains("\"count\""), "payload must be encrypted");
    }

    #[tokio::test]
    async fn session_survives_round_trip() {
        let (headers, _) = get_with_cookie("/count", None).await;
        let cookie = name_value(&session_cookie(&headers).expect("cookie"));
        let (_, body) = get_with_cookie("/count", Some(&cookie)).await;
        assert_eq!(body, "2");
    }

    #[tokio::test]
    async fn unmodified_session_sets_no_cookie() {
        let (headers, _) = get_with_cookie("/count", None).await;
        let cookie = name_value(&session_cookie(&headers).expect("cookie"));
        let (headers, body) = get_with_cookie("/peek", Some(&cookie)).await;
        assert!(body.contains('1'));
        assert!(session_cookie(&headers).is_none());
    }

    #[tokio::test]
    async fn tampered_cookie_yields_empty_session() {
        let (_, body) =
            get_with_cookie("/peek", Some("tagify_user_session=not-encrypted")).await;
        assert_eq!(body, "None");
    }

    #[tokio::test]
    async fn invalidated_session_removes_cookie() {
        let (headers, _) = get_with_cookie("/count", None).await;
        let cookie = name_value(&session_cookie(&headers).expect("cookie"));
        let (headers, _) = get_with_cookie("/destroy", Some(&cookie)).await;
        let removal = session_cookie(&headers).expect("removal cookie");
        assert!(removal.contains("Max-Age=0"));
    }
}
