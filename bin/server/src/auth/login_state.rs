//! Pending OAuth `state` carried across the provider redirect.
//!
//! The session cookie is `SameSite=Strict` and is not sent on the redirect
//! back from the provider, so the pending state travels in its own private
//! `SameSite=Lax` cookie that lives only as long as a login attempt.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::Duration as TimeDuration;

/// Name of the cookie holding the pending OAuth state.
pub const LOGIN_STATE_COOKIE: &str = "tagify_oauth_state";

/// How long a login attempt may take at the provider.
const LOGIN_STATE_MAX_AGE: TimeDuration = TimeDuration::minutes(10);

/// Adds the state sent with the authorize redirect to `jar`.
#[must_use]
pub fn issue(jar: PrivateCookieJar, state: &str, secure: bool) -> PrivateCookieJar {
    let cookie = Cookie::build((LOGIN_STATE_COOKIE, state.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(LOGIN_STATE_MAX_AGE);
    jar.add(cookie)
}

/// Removes the pending state from `jar` and checks it against `received`.
///
/// The cookie is cleared whether or not the state matches.
#[must_use]
pub fn take(jar: PrivateCookieJar, received: Option<&str>) -> (PrivateCookieJar, bool) {
    let expected = jar
        .get(LOGIN_STATE_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let jar = jar.remove(Cookie::build((LOGIN_STATE_COOKIE, "")).path("/"));

    let matches = match (expected.as_deref(), received) {
        (Some(expected), Some(received)) => !expected.is_empty() && expected == received,
        _ => false,
    };
    if !matches {
        tracing::debug!(had_pending = expected.is_some(), "OAuth state did not match");
    }
    (jar, matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    fn jar() -> PrivateCookieJar {
        PrivateCookieJar::new(Key::derive_from(&[7u8; 64]))
    }

    #[test]
    fn issued_state_can_be_read_back() {
        let jar = issue(jar(), "nonce-1", true);
        let cookie = jar.get(LOGIN_STATE_COOKIE).expect("state cookie");
        assert_eq!(cookie.value(), "nonce-1");
    }

    #[test]
    fn matching_state_is_accepted_and_cleared() {
        let (jar, ok) = take(issue(jar(), "nonce-1", false), Some("nonce-1"));
        assert!(ok);
        assert!(jar.get(LOGIN_STATE_COOKIE).is_none());
    }

    #[test]
    fn mismatched_state_is_rejected_and_cleared() {
        let (jar, ok) = take(issue(jar(), "nonce-1", false), Some("nonce-2"));
        assert!(!ok);
        assert!(jar.get(LOGIN_STATE_COOKIE).is_none());
    }

    #[test]
    fn missing_state_is_rejected() {
        let (_, ok) = take(jar(), Some("nonce-1"));
        assert!(!ok);
        let (_, ok) = take(issue(jar(), "nonce-1", false), None);
        assert!(!ok);
    }
}
