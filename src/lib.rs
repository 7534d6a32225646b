pub mod config;
pub mod downloader;
pub mod extractor;
pub mod fetcher;
pub mod format;
pub mod preferences;
pub mod prober;
pub mod scan;
pub mod selection;

pub use extractor::{DiscoverySet, ExtractRules, MediaItem, MediaKind};
pub use fetcher::{FetchError, FetchMode, RenderController, SessionContext};
pub use format::human_size;
