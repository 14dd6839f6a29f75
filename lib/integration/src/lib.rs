//! Upstream music API client for tagify.
//!
//! This crate provides:
//!
//! - **Client factory**: builds a per-request client authorized with a session's token
//! - **Pagination**: accumulation of paginated list results, in upstream order
//!
//! Resource models come from `rspotify` and are re-exported as [`model`].

pub mod client;
pub mod error;
pub mod pagination;

pub use client::{SpotifyClient, UpstreamClientFactory};
pub use error::UpstreamError;
pub use pagination::collect_all;
pub use rspotify::model;
pub use rspotify::prelude::Id;
