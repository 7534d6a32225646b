//! Runtime configuration.
//!
//! Everything has a working default; environment variables override them and
//! the CLI overrides the environment. `Config::from_env` validates numeric
//! values so a typo fails loudly instead of silently using a default.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::fetcher::headless::{
    BrowserChannel, ChromeRenderer, DEFAULT_RENDER_TIMEOUT, DEFAULT_SCROLL_DELAY,
    DEFAULT_SCROLL_STEPS,
};
use crate::prober::{DEFAULT_BATCH_SIZE, DEFAULT_WORKERS};

pub const ENV_CONCURRENCY: &str = "MEDIASWEEP_CONCURRENCY";
pub const ENV_PROBE_BATCH: &str = "MEDIASWEEP_PROBE_BATCH";
pub const ENV_RENDER_TIMEOUT_SECS: &str = "MEDIASWEEP_RENDER_TIMEOUT_SECS";
pub const ENV_SCROLL_STEPS: &str = "MEDIASWEEP_SCROLL_STEPS";
pub const ENV_SCROLL_DELAY_MS: &str = "MEDIASWEEP_SCROLL_DELAY_MS";
pub const ENV_BROWSER_CHANNEL: &str = "MEDIASWEEP_BROWSER_CHANNEL";
pub const ENV_CHROME_PATH: &str = "MEDIASWEEP_CHROME_PATH";
pub const ENV_DOWNLOAD_DIR: &str = "MEDIASWEEP_DOWNLOAD_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    concurrency: usize,
    probe_batch_size: usize,
    render_timeout: Duration,
    scroll_steps: u32,
    scroll_delay: Duration,
    browser_channel: BrowserChannel,
    chrome_path: Option<PathBuf>,
    download_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_WORKERS,
            probe_batch_size: DEFAULT_BATCH_SIZE,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            scroll_steps: DEFAULT_SCROLL_STEPS,
            scroll_delay: DEFAULT_SCROLL_DELAY,
            browser_channel: BrowserChannel::Auto,
            chrome_path: None,
            download_dir: None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    match non_empty_var(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field: key,
            reason: format!("'{raw}': {e}"),
        }),
        None => Ok(default),
    }
}

fn at_least_one(field: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

impl Config {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let concurrency = at_least_one(
            ENV_CONCURRENCY,
            parse_var(ENV_CONCURRENCY, defaults.concurrency)?,
        )?;
        let probe_batch_size = at_least_one(
            ENV_PROBE_BATCH,
            parse_var(ENV_PROBE_BATCH, defaults.probe_batch_size)?,
        )?;
        let render_timeout = Duration::from_secs(parse_var(
            ENV_RENDER_TIMEOUT_SECS,
            defaults.render_timeout.as_secs(),
        )?);
        let scroll_steps = parse_var(ENV_SCROLL_STEPS, defaults.scroll_steps)?;
        let scroll_delay = Duration::from_millis(parse_var(
            ENV_SCROLL_DELAY_MS,
            defaults.scroll_delay.as_millis() as u64,
        )?);
        let browser_channel = parse_var(ENV_BROWSER_CHANNEL, defaults.browser_channel)?;

        Ok(Self {
            concurrency,
            probe_batch_size,
            render_timeout,
            scroll_steps,
            scroll_delay,
            browser_channel,
            chrome_path: non_empty_var(ENV_CHROME_PATH).map(PathBuf::from),
            download_dir: non_empty_var(ENV_DOWNLOAD_DIR).map(PathBuf::from),
        })
    }

    /// Worker pool size for probing and downloading.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
    /// Items probed between progress reports.
    pub fn probe_batch_size(&self) -> usize {
        self.probe_batch_size
    }
    pub fn render_timeout(&self) -> Duration {
        self.render_timeout
    }
    pub fn scroll_steps(&self) -> u32 {
        self.scroll_steps
    }
    pub fn scroll_delay(&self) -> Duration {
        self.scroll_delay
    }
    pub fn browser_channel(&self) -> BrowserChannel {
        self.browser_channel
    }
    pub fn chrome_path(&self) -> Option<&PathBuf> {
        self.chrome_path.as_ref()
    }
    /// Explicit download directory, if one was configured.
    pub fn download_dir(&self) -> Option<&PathBuf> {
        self.download_dir.as_ref()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
    pub fn with_browser_channel(mut self, channel: BrowserChannel) -> Self {
        self.browser_channel = channel;
        self
    }
    pub fn with_chrome_path(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.chrome_path = path;
        }
        self
    }
    pub fn with_download_dir(mut self, dir: Option<PathBuf>) -> Self {
        if dir.is_some() {
            self.download_dir = dir;
        }
        self
    }

    /// Headless renderer configured from this config.
    pub fn renderer(&self) -> ChromeRenderer {
        ChromeRenderer::new(
            self.chrome_path.clone(),
            self.render_timeout,
            self.scroll_steps,
            self.scroll_delay,
        )
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
