//! Session-backed OAuth token lifecycle for tagify.
//!
//! This crate provides:
//! - The OAuth token record and its session transport encoding (`TokenRecord`)
//! - An in-memory view of a browser session (`Session`)
//! - The auth gate and token lifecycle operations (`auth`)
//! - OAuth client configuration (`OAuthConfig`)
//!
//! A session is either anonymous or authenticated; it becomes authenticated
//! when a token is stored after a successful code exchange, and anonymous
//! again on logout or when the session expires.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use tagify_platform_access::{Session, TokenRecord, auth};
//!
//! let mut session = Session::new();
//! assert!(!auth::is_logged_in(&session));
//!
//! let token = TokenRecord::new("access", "Bearer", Utc::now() + Duration::hours(1))
//!     .with_refresh_token("refresh");
//! auth::store_token(&mut session, &token).expect("token encodes");
//! assert!(auth::is_logged_in(&session));
//!
//! auth::logout(&mut session);
//! assert!(!auth::is_logged_in(&session));
//! ```

pub mod auth;
pub mod error;
pub mod oauth;
pub mod session;
pub mod token;

pub use error::{AuthError, TokenCodecError};
pub use oauth::{OAuthConfig, OAuthConfigBuilder};
pub use session::{Session, SessionPayload};
pub use token::TokenRecord;
