//! Streams selected media to a destination directory.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use serde::Serialize;
use thiserror::Error;
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufWriter},
    sync::Semaphore,
    task::JoinSet,
};
use tracing::{info, instrument, warn};
use url::Url;

use crate::extractor::MediaItem;
use crate::fetcher::{FetchError, SessionContext, get_client};

/// Write buffer size; the body reaches disk in chunks of this size.
pub const CHUNK_SIZE: usize = 128 * 1024;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error(transparent)]
    Transport(#[from] FetchError),

    #[error("cannot write {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub bytes_written: u64,
}

/// Result for one selected item. Failures keep the original URL.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub url: Url,
    pub filename: String,
    pub result: Result<DownloadedFile, DownloadError>,
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Keep only the final path component; `..` and separators never escape `dest`.
pub fn safe_file_name(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("file_{}", Utc::now().timestamp()))
}

/// Assign one target name per item, suffixing `-1`, `-2`, … on collisions.
fn unique_names(items: &[MediaItem]) -> Vec<String> {
    let mut used = HashSet::new();
    items
        .iter()
        .map(|item| {
            let name = safe_file_name(item.filename());
            if used.insert(name.clone()) {
                return name;
            }
            let (stem, ext) = match name.rsplit_once('.') {
                Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{ext}")),
                _ => (name.clone(), String::new()),
            };
            (1..)
                .map(|n| format!("{stem}-{n}{ext}"))
                .find(|candidate| used.insert(candidate.clone()))
                .unwrap_or(name)
        })
        .collect()
}

async fn write_body(
    response: reqwest::Response,
    path: &Path,
) -> Result<u64, DownloadError> {
    let fs_error = |source| DownloadError::Filesystem {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).await.map_err(fs_error)?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut total_written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::from_reqwest_error)?;
        if chunk.is_empty() {
            continue;
        }
        writer.write_all(&chunk).await.map_err(fs_error)?;
        total_written += chunk.len() as u64;
    }
    writer.flush().await.map_err(fs_error)?;

    Ok(total_written)
}

/// Download one item to `path`. A failure part-way may leave a partial file.
#[instrument(skip_all, fields(url = %url))]
pub async fn download_one(
    url: &Url,
    path: &Path,
    session: &SessionContext,
) -> Result<DownloadedFile, DownloadError> {
    let response = session
        .apply(get_client().get(url.clone()))
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    if !response.status().is_success() {
        return Err(FetchError::from_status(response.status()).into());
    }

    let bytes_written = write_body(response, path).await?;
    Ok(DownloadedFile {
        path: path.to_path_buf(),
        bytes_written,
    })
}

/// Download `items` into `dest`, at most `workers` at a time.
///
/// `dest` is created when missing. Every item gets an outcome, in input
/// order; one item's failure does not affect the others.
pub async fn download_all(
    items: &[MediaItem],
    dest: &Path,
    session: Arc<SessionContext>,
    workers: usize,
) -> Vec<DownloadOutcome> {
    if let Err(e) = tokio::fs::create_dir_all(dest).await {
        warn!("cannot create {}: {}", dest.display(), e);
        return items
            .iter()
            .map(|item| DownloadOutcome {
                url: item.url().clone(),
                filename: item.filename().to_string(),
                result: Err(DownloadError::Filesystem {
                    path: dest.to_path_buf(),
                    source: io::Error::new(e.kind(), e.to_string()),
                }),
            })
            .collect();
    }

    let names = unique_names(items);
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    for (index, (item, name)) in items.iter().zip(names).enumerate() {
        let url = item.url().clone();
        let path = dest.join(name);
        let session = session.clone();
        let semaphore = semaphore.clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (index, download_one(&url, &path, &session).await)
        });
    }

    let mut results: Vec<Option<Result<DownloadedFile, DownloadError>>> =
        items.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => warn!("download task did not complete: {}", e),
        }
    }

    let outcomes: Vec<DownloadOutcome> = items
        .iter()
        .zip(results)
        .map(|(item, result)| DownloadOutcome {
            url: item.url().clone(),
            filename: item.filename().to_string(),
            result: result.unwrap_or_else(|| {
                Err(FetchError::Unknown("download task aborted".to_string()).into())
            }),
        })
        .collect();

    let ok = outcomes.iter().filter(|o| o.is_success()).count();
    info!(ok, failed = outcomes.len() - ok, dest = %dest.display(), "downloads finished");
    outcomes
}
