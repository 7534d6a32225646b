//! One scan: fetch the page, extract media, probe sizes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

use crate::extractor::{DiscoverySet, ExtractRules, extract_media};
use crate::fetcher::{FetchError, FetchMode, RenderController, SessionContext};
use crate::prober::{self, DEFAULT_BATCH_SIZE, DEFAULT_WORKERS, ProbeProgress};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no images or videos found at {url}")]
    NoMedia { url: String },
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub mode: FetchMode,
    pub rules: ExtractRules,
    pub workers: usize,
    pub batch_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            mode: FetchMode::Static,
            rules: ExtractRules::default(),
            workers: DEFAULT_WORKERS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Probed discovery set plus the session needed to download from it.
#[derive(Debug)]
pub struct ScanReport {
    pub page_url: Url,
    pub mode: FetchMode,
    pub session: Arc<SessionContext>,
    pub items: DiscoverySet,
    pub fetched_at: DateTime<Utc>,
}

#[instrument(skip_all, fields(url = %url))]
pub async fn scan<F>(
    controller: &RenderController,
    url: &str,
    options: &ScanOptions,
    on_progress: F,
) -> Result<ScanReport, ScanError>
where
    F: FnMut(ProbeProgress),
{
    let page = controller.fetch(url, options.mode).await?;

    let mut items = extract_media(&page.final_url, &page.html, &options.rules);
    if items.is_empty() {
        return Err(ScanError::NoMedia {
            url: url.to_string(),
        });
    }
    info!(items = items.len(), mode = ?page.mode, "media discovered");

    let session = Arc::new(page.session);
    prober::enrich_in_batches(
        items.items_mut(),
        session.clone(),
        options.workers,
        options.batch_size,
        on_progress,
    )
    .await;

    Ok(ScanReport {
        page_url: page.final_url,
        mode: page.mode,
        session,
        items,
        fetched_at: page.fetched_at,
    })
}
