//! Auth gate and token lifecycle.
//!
//! These functions read and mutate a [`Session`]; persisting it is the
//! caller's job. A session is anonymous until it carries a token:
//!
//! - anonymous → logged in: [`store_token`] after a successful code exchange
//! - logged in → anonymous: [`logout`], or the session store's own expiry
//!
//! No transition refreshes the token.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{AuthError, TokenCodecError};
use crate::session::Session;
use crate::token::TokenRecord;

/// Session key holding the encoded token record.
pub const TOKEN_SESSION_KEY: &str = "spotify-token";

/// Session keys written by earlier releases that stored the token in pieces.
pub const LEGACY_TOKEN_KEYS: &[&str] = &["spotify-access-token", "spotify-refresh-token"];

/// Returns true iff a token can be read from `session`.
#[must_use]
pub fn is_logged_in(session: &Session) -> bool {
    get_token(session).is_ok()
}

/// Reads the token record stored in `session`.
///
/// # Errors
///
/// - `AuthError::NotFound` if nothing is stored under the token key
/// - `AuthError::TypeMismatch` if the stored value is not a string
/// - `AuthError::Decoding` if the string is not a valid token encoding
pub fn get_token(session: &Session) -> Result<TokenRecord, AuthError> {
    let value = session
        .get(TOKEN_SESSION_KEY)
        .ok_or_else(|| AuthError::NotFound {
            key: TOKEN_SESSION_KEY.to_string(),
        })?;

    let encoded = value.as_str().ok_or_else(|| AuthError::TypeMismatch {
        key: TOKEN_SESSION_KEY.to_string(),
        found: json_type_name(value).to_string(),
    })?;

    Ok(TokenRecord::decode(encoded)?)
}

/// Stores `token` in `session` and makes the session expire with the token.
///
/// # Errors
///
/// Returns `TokenCodecError::Encoding` if the token cannot be encoded; the
/// session is left untouched in that case.
pub fn store_token(session: &mut Session, token: &TokenRecord) -> Result<(), TokenCodecError> {
    let encoded = token.encode()?;
    session.set(TOKEN_SESSION_KEY, encoded);
    session.expire_at(token.expiry());
    tracing::debug!(expiry = %token.expiry(), "stored token in session");
    Ok(())
}

/// Removes every token key from `session` and invalidates it.
pub fn logout(session: &mut Session) {
    session.delete(TOKEN_SESSION_KEY);
    for key in LEGACY_TOKEN_KEYS {
        session.delete(key);
    }
    session.set_max_age(chrono::Duration::seconds(-1));
}

/// Returns true if the token's expiry has passed at `now`.
///
/// Informational only; the gate never rejects an expired token.
#[must_use]
pub fn token_expired_at(token: &TokenRecord, now: DateTime<Utc>) -> bool {
    token.expiry() <= now
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
