//! Headless browser collaborator.
//!
//! [`ChromeRenderer`] drives a local Chrome/Chromium over CDP (via
//! `chromiumoxide`) to obtain a fully rendered document plus the cookies of
//! that browser session. It is only used when a static fetch is not enough.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::fetcher::{errors::FetchError, types::RenderedPage};

pub const DEFAULT_SCROLL_STEPS: u32 = 6;
pub const DEFAULT_SCROLL_DELAY: Duration = Duration::from_millis(400);
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(40);

const REMEDIATION: &str = "install Chrome or Chromium (e.g. `sudo apt install chromium`, \
     or https://www.google.com/chrome/), or point MEDIASWEEP_CHROME_PATH / --chrome-path \
     at the browser executable";

/// Which installed browser build to prefer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserChannel {
    #[default]
    Auto,
    Chrome,
    Edge,
}

impl BrowserChannel {
    fn candidates(self) -> &'static [&'static str] {
        match self {
            Self::Auto => &[],
            Self::Chrome => &[
                "/usr/bin/google-chrome",
                "/usr/bin/google-chrome-stable",
                "/opt/google/chrome/google-chrome",
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            ],
            Self::Edge => &[
                "/usr/bin/microsoft-edge",
                "/usr/bin/microsoft-edge-stable",
                "/opt/microsoft/msedge/msedge",
                "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
                r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
                r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
            ],
        }
    }
}

impl FromStr for BrowserChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" | "(auto)" => Ok(Self::Auto),
            "chrome" => Ok(Self::Chrome),
            "msedge" | "edge" => Ok(Self::Edge),
            other => Err(format!(
                "unknown browser channel '{other}' (expected auto, chrome or msedge)"
            )),
        }
    }
}

/// One headless render of `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub url: String,
    pub channel: BrowserChannel,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeadlessRenderer: Send + Sync {
    /// Render the page and capture HTML, cookies and referer.
    async fn render(&self, request: &RenderRequest) -> Result<RenderedPage, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    executable: Option<PathBuf>,
    timeout: Duration,
    scroll_steps: u32,
    scroll_delay: Duration,
}

impl Default for ChromeRenderer {
    fn default() -> Self {
        Self {
            executable: None,
            timeout: DEFAULT_RENDER_TIMEOUT,
            scroll_steps: DEFAULT_SCROLL_STEPS,
            scroll_delay: DEFAULT_SCROLL_DELAY,
        }
    }
}

impl ChromeRenderer {
    pub fn new(
        executable: Option<PathBuf>,
        timeout: Duration,
        scroll_steps: u32,
        scroll_delay: Duration,
    ) -> Self {
        Self {
            executable,
            timeout,
            scroll_steps,
            scroll_delay,
        }
    }

    /// Explicit path first, then the channel's well-known install locations.
    /// `None` leaves detection to chromiumoxide.
    fn resolve_executable(&self, channel: BrowserChannel) -> Result<Option<PathBuf>, FetchError> {
        if let Some(path) = &self.executable {
            if path.exists() {
                return Ok(Some(path.clone()));
            }
            return Err(FetchError::RenderingUnavailable(format!(
                "browser executable {} does not exist; {REMEDIATION}",
                path.display()
            )));
        }

        if channel == BrowserChannel::Auto {
            return Ok(None);
        }

        channel
            .candidates()
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .map(Some)
            .ok_or_else(|| {
                FetchError::RenderingUnavailable(format!(
                    "no {channel:?} installation found; {REMEDIATION}"
                ))
            })
    }
}

/// `name=value; name=value` for a `Cookie` header, skipping nameless entries.
pub fn cookie_header<'a>(cookies: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    cookies
        .into_iter()
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(feature = "headless")]
mod chrome {
    use super::*;
    use crate::fetcher::client::USER_AGENT;
    use crate::fetcher::types::{FetchMode, SessionContext};
    use chromiumoxide::{Browser, BrowserConfig, Page};
    use chrono::Utc;
    use futures::StreamExt;
    use tracing::{debug, info, instrument, warn};
    use url::Url;

    const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

    fn render_error(err: impl std::fmt::Display) -> FetchError {
        FetchError::Rendering(err.to_string())
    }

    impl ChromeRenderer {
        async fn launch(&self, channel: BrowserChannel) -> Result<Browser, FetchError> {
            let mut builder = BrowserConfig::builder()
                .request_timeout(self.timeout)
                .arg("--disable-blink-features=AutomationControlled")
                .arg("--disable-dev-shm-usage")
                .arg("--no-first-run")
                .arg("--no-default-browser-check")
                .arg("--disable-gpu")
                .arg("--no-sandbox")
                .arg(format!("--user-agent={USER_AGENT}"));

            if let Some(path) = self.resolve_executable(channel)? {
                info!("Using browser at {}", path.display());
                builder = builder.chrome_executable(path);
            }

            let config = builder
                .build()
                .map_err(|e| FetchError::RenderingUnavailable(format!("{e}; {REMEDIATION}")))?;

            let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
                FetchError::RenderingUnavailable(format!("failed to launch browser: {e}; {REMEDIATION}"))
            })?;

            tokio::spawn(async move { while handler.next().await.is_some() {} });

            Ok(browser)
        }

        async fn capture(
            &self,
            browser: &Browser,
            page: &Page,
            url: &str,
        ) -> Result<RenderedPage, FetchError> {
            tokio::time::timeout(self.timeout, page.goto(url))
                .await
                .map_err(|_| FetchError::Rendering(format!("navigation to {url} timed out")))?
                .map_err(render_error)?;

            // Network quiescence: wait for the load event to settle.
            match tokio::time::timeout(self.timeout, page.wait_for_navigation()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("waiting for page load failed: {}", e),
                Err(_) => warn!("timed out waiting for page load"),
            }

            for step in 0..self.scroll_steps {
                if let Err(e) = page.evaluate(SCROLL_TO_BOTTOM).await {
                    debug!(step, "scroll failed: {}", e);
                    break;
                }
                tokio::time::sleep(self.scroll_delay).await;
            }

            let html = page.content().await.map_err(render_error)?;

            let final_url = page
                .url()
                .await
                .ok()
                .flatten()
                .and_then(|u| Url::parse(&u).ok())
                .map_or_else(|| Url::parse(url), Ok)?;

            // Browser-wide, so cookies set for CDN or API hosts are kept too.
            let cookies = match browser.get_cookies().await {
                Ok(cookies) => cookies,
                Err(e) => {
                    warn!("could not read browser cookies: {}", e);
                    Vec::new()
                }
            };
            let cookie_header =
                cookie_header(cookies.iter().map(|c| (c.name.as_str(), c.value.as_str())));

            debug!(cookies = cookies.len(), bytes = html.len(), "headless capture complete");

            Ok(RenderedPage {
                html,
                final_url,
                session: SessionContext::new(Some(cookie_header), Some(url.to_string())),
                mode: FetchMode::Headless,
                fetched_at: Utc::now(),
            })
        }
    }

    #[async_trait]
    impl HeadlessRenderer for ChromeRenderer {
        #[instrument(skip_all, fields(url = %request.url))]
        async fn render(&self, request: &RenderRequest) -> Result<RenderedPage, FetchError> {
            let mut browser = self.launch(request.channel).await?;

            let result = match browser.new_page("about:blank").await {
                Ok(page) => self.capture(&browser, &page, &request.url).await,
                Err(e) => Err(render_error(e)),
            };

            if let Err(e) = browser.close().await {
                debug!("browser close failed: {}", e);
            }
            let _ = browser.wait().await;

            result
        }
    }
}

#[cfg(not(feature = "headless"))]
#[async_trait]
impl HeadlessRenderer for ChromeRenderer {
    async fn render(&self, _request: &RenderRequest) -> Result<RenderedPage, FetchError> {
        Err(FetchError::RenderingUnavailable(
            "this build has no headless support; rebuild with `--features headless`".to_string(),
        ))
    }
}
