//! Size and content-type discovery without downloading media bodies.
//!
//! Each item gets a HEAD request. When HEAD is refused or does not carry a
//! `Content-Length`, a GET is sent and only its headers are read, whatever its
//! status; the body is dropped unread. Transport failures leave the size
//! unknown. Probes never ask for compressed bodies to be decoded, so a
//! `Content-Length` sent with `Content-Encoding` survives.

use std::sync::Arc;

use reqwest::{Response, header};
use serde::Serialize;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::extractor::MediaItem;
use crate::fetcher::{FetchError, SessionContext, probe_client};

pub const DEFAULT_WORKERS: usize = 16;
pub const DEFAULT_BATCH_SIZE: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub size_bytes: Option<u64>,
    pub content_type: String,
}

/// Reported after every probed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeProgress {
    pub done: usize,
    pub total: usize,
    pub known_bytes: u64,
}

fn header_content_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn header_content_type(response: &Response) -> String {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn try_probe(url: &Url, session: &SessionContext) -> Result<ProbeResult, FetchError> {
    let client = probe_client();

    let head = session
        .apply(client.head(url.clone()))
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    if head.status().as_u16() < 400
        && let Some(size) = header_content_length(&head)
    {
        return Ok(ProbeResult {
            size_bytes: Some(size),
            content_type: header_content_type(&head),
        });
    }
    debug!(status = %head.status(), "HEAD inconclusive, falling back to GET");

    // send() resolves once headers arrive; dropping the response abandons the body.
    let get = session
        .apply(client.get(url.clone()))
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    if !get.status().is_success() {
        debug!(status = %get.status(), "GET refused, keeping its headers anyway");
    }

    Ok(ProbeResult {
        size_bytes: header_content_length(&get),
        content_type: header_content_type(&get),
    })
}

/// Probe one URL. Never fails; problems surface as an unknown size.
#[instrument(skip_all, fields(url = %url))]
pub async fn probe(url: &Url, session: &SessionContext) -> ProbeResult {
    match try_probe(url, session).await {
        Ok(result) => result,
        Err(e) => {
            warn!("probe failed: {}", e);
            ProbeResult::default()
        }
    }
}

/// Probe every item concurrently with at most `workers` requests in flight.
///
/// Returns when every item has a result. Completion order is arbitrary; each
/// item is written exactly once.
pub async fn enrich(items: &mut [MediaItem], session: Arc<SessionContext>, workers: usize) {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    for (index, item) in items.iter().enumerate() {
        let url = item.url().clone();
        let session = session.clone();
        let semaphore = semaphore.clone();
        tasks.spawn(async move {
            // The semaphore is never closed.
            let _permit = semaphore.acquire_owned().await.ok();
            (index, probe(&url, &session).await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => {
                let item = &mut items[index];
                item.size_bytes = result.size_bytes;
                item.content_type = result.content_type;
            }
            // A panicked probe leaves its item unknown.
            Err(e) => warn!("probe task did not complete: {}", e),
        }
    }
}

/// Probe in consecutive sub-batches, reporting progress after each one.
pub async fn enrich_in_batches<F>(
    items: &mut [MediaItem],
    session: Arc<SessionContext>,
    workers: usize,
    batch_size: usize,
    mut on_progress: F,
) where
    F: FnMut(ProbeProgress),
{
    let total = items.len();
    let batch_size = batch_size.max(1);
    let mut done = 0;

    while done < total {
        let end = (done + batch_size).min(total);
        enrich(&mut items[done..end], session.clone(), workers).await;
        done = end;

        on_progress(ProbeProgress {
            done,
            total,
            known_bytes: items.iter().filter_map(|i| i.size_bytes).sum(),
        });
    }
}
