//! Accumulation of paginated list results.

use futures::{Stream, StreamExt};
use rootcause::prelude::Report;
use rspotify::ClientError;
use std::pin::pin;
use std::time::Duration;
use tracing::debug;

use crate::error::UpstreamError;

/// Drains a paginated listing and returns all items.
///
/// `pages` yields items one at a time and fetches the next page once the
/// current one is used up, stopping after the last page. Items keep
/// upstream order. Any failed fetch aborts the whole accumulation and the
/// items gathered so far are dropped.
///
/// `call_timeout` bounds each wait on the stream, so a stalled page fetch
/// fails with [`UpstreamError::Timeout`]. Dropping the returned future stops
/// pagination between pages and aborts the in-flight request.
pub async fn collect_all<T, S>(
    pages: S,
    call_timeout: Duration,
) -> Result<Vec<T>, Report<UpstreamError>>
where
    S: Stream<Item = Result<T, ClientError>>,
{
    let mut pages = pin!(pages);
    let mut items = Vec::new();

    while let Some(item) = tokio::time::timeout(call_timeout, pages.next())
        .await
        .map_err(|_| UpstreamError::Timeout)?
    {
        items.push(item.map_err(UpstreamError::from_client)?);
    }

    debug!(items = items.len(), "collected paginated results");
    Ok(items)
}
