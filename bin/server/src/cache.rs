//! In-process cache of rendered pages.
//!
//! Entries are keyed by method, session cookie and path, so a page rendered
//! for one session is never served to another. The query string is not part
//! of the key: no cached page reads it. Only clean `200` responses are
//! stored, and never more than a fixed number of them.

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{RecordedErrors, record_error};

/// A stored response.
#[derive(Debug, Clone)]
struct CachedPage {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    stored_at: Instant,
}

impl CachedPage {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }

    fn to_response(&self) -> Response {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();
        response
    }
}

/// Cache of rendered pages with a fixed time-to-live.
#[derive(Debug)]
pub struct PageCache {
    entries: DashMap<String, CachedPage>,
    ttl: Duration,
    max_entries: usize,
    cookie_name: String,
}

impl PageCache {
    /// Creates an empty cache holding at most `max_entries` pages.
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize, cookie_name: String) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
            cookie_name,
        }
    }

    /// Returns the number of stored entries, fresh or not.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Removes every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, page| page.is_fresh(now, self.ttl));
        before.saturating_sub(self.entries.len())
    }

    fn key_for(&self, request: &Request) -> String {
        let jar = CookieJar::from_headers(request.headers());
        let session = jar
            .get(&self.cookie_name)
            .map(|c| c.value().to_string())
            .unwrap_or_default();
        format!("{} {} {}", request.method(), session, request.uri().path())
    }

    fn lookup(&self, key: &str) -> Option<Response> {
        let now = Instant::now();
        // Clone out so the shard lock is released before any removal.
        let hit = self.entries.get(key).map(|entry| entry.value().clone())?;
        if hit.is_fresh(now, self.ttl) {
            return Some(hit.to_response());
        }
        self.entries
            .remove_if(key, |_, page| !page.is_fresh(now, self.ttl));
        None
    }

    fn store(&self, key: String, status: StatusCode, headers: HeaderMap, body: Bytes) {
        if !self.entries.contains_key(&key) && self.entry_count() >= self.max_entries {
            self.purge_expired();
            if self.entry_count() >= self.max_entries {
                tracing::debug!(max_entries = self.max_entries, "page cache full, not storing");
                return;
            }
        }
        self.entries.insert(
            key,
            CachedPage {
                status,
                headers,
                body,
                stored_at: Instant::now(),
            },
        );
    }
}

fn is_cacheable(response: &Response) -> bool {
    response.status() == StatusCode::OK
        && !response.headers().contains_key(header::SET_COOKIE)
        && response.extensions().get::<RecordedErrors>().is_none()
}

/// Serves pages from the cache, storing cacheable responses on a miss.
pub async fn cache_pages(
    State(cache): State<Arc<PageCache>>,
    request: Request,
    next: Next,
) -> Response {
    let key = cache.key_for(&request);
    if let Some(response) = cache.lookup(&key) {
        tracing::debug!(%key, "page cache hit");
        return response;
    }

    let response = next.run(request).await;
    if !is_cacheable(&response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            cache.store(key, parts.status, parts.headers.clone(), bytes.clone());
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
            record_error(&mut response, format!("failed to buffer page: {e}"));
            response
        }
    }
}
