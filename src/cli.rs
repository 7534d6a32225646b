use std::path::PathBuf;

use clap::Parser;
use mediasweep::MediaKind;
use mediasweep::fetcher::BrowserChannel;
use mediasweep::selection::SortOrder;

/// Find the images and videos on a web page and download the ones you want
#[derive(Parser, Debug)]
#[command(name = "mediasweep", author, version, about, long_about = None)]
pub struct Cli {
    /// Page to scan
    pub url: String,

    /// Render the page in a headless browser instead of a plain GET
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Browser build to prefer: auto, chrome or msedge
    #[arg(long, value_parser = parse_channel)]
    pub channel: Option<BrowserChannel>,

    /// Path to the Chrome/Chromium executable
    #[arg(long)]
    pub chrome_path: Option<PathBuf>,

    /// Image extensions, comma separated
    #[arg(long, value_delimiter = ',')]
    pub images: Vec<String>,

    /// Video extensions, comma separated
    #[arg(long, value_delimiter = ',')]
    pub videos: Vec<String>,

    /// Only download these kinds (image, video); can be repeated
    #[arg(long, value_delimiter = ',', value_parser = parse_kind)]
    pub kind: Vec<MediaKind>,

    /// Smallest size to download, in KB
    #[arg(long)]
    pub min_kb: Option<f64>,

    /// Largest size to download, in KB
    #[arg(long)]
    pub max_kb: Option<f64>,

    /// Order downloads by size: asc or desc
    #[arg(long, default_value = "none")]
    pub sort: SortOrder,

    /// Destination directory (defaults to the last one used)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Do not remember --dir for next time
    #[arg(long, default_value_t = false)]
    pub no_remember: bool,

    /// Scan and list, but download nothing
    #[arg(long, default_value_t = false)]
    pub list_only: bool,

    /// Concurrent probes and downloads
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Log as JSON lines
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

fn parse_channel(raw: &str) -> Result<BrowserChannel, String> {
    raw.parse()
}

fn parse_kind(raw: &str) -> Result<MediaKind, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "image" | "images" => Ok(MediaKind::Image),
        "video" | "videos" => Ok(MediaKind::Video),
        other => Err(format!("unknown kind '{other}' (expected image or video)")),
    }
}
