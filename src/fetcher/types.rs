use chrono::{DateTime, Utc};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Charset {
    Utf8,
    Windows1252,
    ShiftJis,
    Gb2312,
    Big5,
    Other(String),
}

impl Charset {
    pub fn from_encoding(encoding: &'static encoding_rs::Encoding) -> Self {
        use std::ptr;

        if ptr::eq(encoding, encoding_rs::UTF_8) {
            Self::Utf8
        } else if ptr::eq(encoding, encoding_rs::WINDOWS_1252) {
            Self::Windows1252
        } else if ptr::eq(encoding, encoding_rs::SHIFT_JIS) {
            Self::ShiftJis
        } else if ptr::eq(encoding, encoding_rs::GBK) || ptr::eq(encoding, encoding_rs::GB18030) {
            Self::Gb2312
        } else if ptr::eq(encoding, encoding_rs::BIG5) {
            Self::Big5
        } else {
            Self::Other(encoding.name().to_string())
        }
    }
}

/// A statically fetched HTML page.
#[derive(Debug)]
pub struct PageResponse {
    pub url_final: Url,
    pub body_utf8: String,
    pub charset: Charset,
    pub fetched_at: DateTime<Utc>,
}

/// How the page HTML was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    Static,
    Headless,
}

/// Cookie and referer captured from a headless navigation.
///
/// Empty after a static fetch. Probes and downloads send whatever is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    cookie_header: Option<String>,
    referer: Option<String>,
}

impl SessionContext {
    pub fn new(cookie_header: Option<String>, referer: Option<String>) -> Self {
        Self {
            cookie_header: cookie_header.filter(|c| !c.is_empty()),
            referer: referer.filter(|r| !r.is_empty()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cookie_header.is_none() && self.referer.is_none()
    }

    pub fn cookie_header(&self) -> Option<&str> {
        self.cookie_header.as_deref()
    }

    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    /// Adds the `Referer` and `Cookie` headers to an outgoing request.
    pub fn apply(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(referer) = &self.referer {
            request = request.header(reqwest::header::REFERER, referer);
        }
        if let Some(cookies) = &self.cookie_header {
            request = request.header(reqwest::header::COOKIE, cookies);
        }
        request
    }
}

/// The document a scan extracts media from.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub final_url: Url,
    pub session: SessionContext,
    pub mode: FetchMode,
    pub fetched_at: DateTime<Utc>,
}

impl From<PageResponse> for RenderedPage {
    fn from(page: PageResponse) -> Self {
        Self {
            html: page.body_utf8,
            final_url: page.url_final,
            session: SessionContext::empty(),
            mode: FetchMode::Static,
            fetched_at: page.fetched_at,
        }
    }
}
