use crate::fetcher::{errors::FetchError, pipeline::process_response, types::PageResponse};
use once_cell::sync::Lazy;
use reqwest::{
    Client, ClientBuilder,
    header::{self, HeaderMap, HeaderValue},
};
use std::time::Duration;
use tracing::{debug, instrument};

const MAX_BODY_SIZE: u64 = 10 * 1024 * 1024; // 10MB
const PAGE_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const IO_TIMEOUT: Duration = Duration::from_secs(20);
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";

/// Header set sent with every request so origins treat us like a browser.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-TW,zh;q=0.9,en;q=0.8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

fn builder() -> ClientBuilder {
    ClientBuilder::new()
        .connect_timeout(IO_TIMEOUT)
        .read_timeout(IO_TIMEOUT)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers(browser_headers())
}

// No overall timeout: downloads may legitimately stream for minutes.
static HTTP_CLIENT: Lazy<Client> =
    Lazy::new(|| builder().build().expect("Failed to build HTTP client"));

// Transparent decompression strips Content-Length, which probing needs.
static PROBE_CLIENT: Lazy<Client> = Lazy::new(|| {
    builder()
        .no_gzip()
        .no_brotli()
        .no_deflate()
        .build()
        .expect("Failed to build probe client")
});

pub fn get_client() -> &'static Client {
    &HTTP_CLIENT
}

/// Client for size probes: never decodes bodies, so headers arrive as sent.
pub fn probe_client() -> &'static Client {
    &PROBE_CLIENT
}

/// Static page fetch: GET, follow redirects, fail on non-2xx.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch(url: &str) -> Result<PageResponse, FetchError> {
    let parsed_url = url::Url::parse(url)?;

    let response = HTTP_CLIENT
        .get(parsed_url)
        .timeout(PAGE_TIMEOUT)
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    if let Some(content_length) = response.content_length()
        && content_length > MAX_BODY_SIZE
    {
        return Err(FetchError::BodyTooLarge(content_length));
    }

    let final_url = response.url().clone();
    let status = response.status();

    if !status.is_success() {
        debug!(%status, "static fetch rejected");
        return Err(FetchError::from_status(status));
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    let body_bytes = response
        .bytes()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    // Content-Length may have been missing
    if body_bytes.len() as u64 > MAX_BODY_SIZE {
        return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
    }

    debug!(%final_url, bytes = body_bytes.len(), "static fetch complete");
    Ok(process_response(final_url, &body_bytes, &content_type))
}
