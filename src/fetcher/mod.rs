pub mod client;
pub mod errors;
pub mod headless;
pub mod pipeline;
pub mod render;
pub mod types;

pub use client::{fetch, get_client, probe_client};
pub use errors::FetchError;
pub use headless::{BrowserChannel, ChromeRenderer, HeadlessRenderer, RenderRequest};
pub use render::{FetchMode, RenderController};
pub use types::{Charset, PageResponse, RenderedPage, SessionContext};
