//! Core types and utilities for tagify.
//!
//! This crate provides the foundational types and error handling shared by
//! the session/auth layer, the upstream client, and the web server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, PlaylistId};
