//! In-memory view of a browser session.
//!
//! A session is a map of string keys to JSON values plus an expiry policy.
//! The web layer loads it from the session cookie at the start of a request
//! and writes it back only if it was modified.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Serialized form of a session, as carried by the session store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    /// Stored key/value pairs.
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
    /// Absolute time after which the payload must be ignored.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Key/value state shared between the server and one browser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    values: BTreeMap<String, Value>,
    expires_at: Option<DateTime<Utc>>,
    invalidated: bool,
    modified: bool,
}

impl Session {
    /// Creates an empty, unmodified session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a session from its payload.
    ///
    /// A payload that expired at or before `now` yields an empty session.
    #[must_use]
    pub fn from_payload(payload: SessionPayload, now: DateTime<Utc>) -> Self {
        if payload.expires_at.is_some_and(|at| at <= now) {
            tracing::debug!("discarding expired session payload");
            return Self::new();
        }
        Self {
            values: payload.values,
            expires_at: payload.expires_at,
            invalidated: false,
            modified: false,
        }
    }

    /// Returns the payload to persist.
    #[must_use]
    pub fn to_payload(&self) -> SessionPayload {
        SessionPayload {
            values: self.values.clone(),
            expires_at: self.expires_at,
        }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
        self.modified = true;
    }

    /// Removes the value stored under `key`, returning it.
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    /// Makes the session expire at `at`.
    pub fn expire_at(&mut self, at: DateTime<Utc>) {
        self.expires_at = Some(at);
        self.invalidated = false;
        self.modified = true;
    }

    /// Sets the session max-age relative to now.
    ///
    /// A zero or negative max-age invalidates the session immediately.
    pub fn set_max_age(&mut self, max_age: Duration) {
        if max_age <= Duration::zero() {
            self.invalidated = true;
            self.modified = true;
        } else {
            self.expire_at(Utc::now() + max_age);
        }
    }

    /// Returns the max-age the store should apply at `now`.
    ///
    /// `None` means the store's default applies. Invalidated sessions report
    /// a negative max-age.
    #[must_use]
    pub fn max_age_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.invalidated {
            return Some(Duration::seconds(-1));
        }
        self.expires_at.map(|at| at - now)
    }

    /// Returns true if the session must be destroyed by the store.
    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// Returns true if the session changed since it was loaded.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_session_is_empty_and_clean() {
        let session = Session::new();
        assert!(session.to_payload().values.is_empty());
        assert!(!session.is_modified());
        assert!(session.to_payload().expires_at.is_none());
        assert!(session.max_age_at(Utc::now()).is_none());
    }

    #[test]
    fn set_get_delete() {
        let mut session = Session::new();
        session.set("greeting", "hello");
        assert_eq!(session.get("greeting"), Some(&json!("hello")));
        assert!(session.is_modified());

        assert_eq!(session.delete("greeting"), Some(json!("hello")));
        assert!(session.get("greeting").is_none());
    }

    #[test]
    fn deleting_missing_key_does_not_modify() {
        let mut session = Session::from_payload(SessionPayload::default(), Utc::now());
        assert!(session.delete("absent").is_none());
        assert!(!session.is_modified());
    }

    #[test]
    fn payload_roundtrip() {
        let mut session = Session::new();
        session.set("count", 3);
        let expiry = Utc::now() + Duration::hours(1);
        session.expire_at(expiry);

        let restored = Session::from_payload(session.to_payload(), Utc::now());
        assert_eq!(restored.get("count"), Some(&json!(3)));
        assert_eq!(restored.to_payload().expires_at, Some(expiry));
        assert!(!restored.is_modified());
    }

    #[test]
    fn expired_payload_is_discarded() {
        let now = Utc::now();
        let payload = SessionPayload {
            values: BTreeMap::from([("k".to_string(), json!("v"))]),
            expires_at: Some(now - Duration::seconds(1)),
        };
        let session = Session::from_payload(payload, now);
        assert!(session.to_payload().values.is_empty());
        assert!(session.to_payload().expires_at.is_none());
    }

    #[test]
    fn max_age_tracks_expiry() {
        let now = Utc::now();
        let mut session = Session::new();
        session.expire_at(now + Duration::minutes(10));
        assert_eq!(session.max_age_at(now), Some(Duration::minutes(10)));
    }

    #[test]
    fn negative_max_age_invalidates() {
        let mut session = Session::new();
        session.set("k", "v");
        session.set_max_age(Duration::seconds(-1));
        assert!(session.is_invalidated());
        assert!(session.max_age_at(Utc::now()).expect("max age") < Duration::zero());
    }

    #[test]
    fn positive_max_age_sets_expiry() {
        let before = Utc::now();
        let mut session = Session::new();
        session.set_max_age(Duration::minutes(61));
        let expires_at = session.to_payload().expires_at.expect("expiry set");
        assert!(expires_at >= before + Duration::minutes(61));
        assert!(!session.is_invalidated());
    }
}
