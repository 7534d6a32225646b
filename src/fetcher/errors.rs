use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("connection failure: {0}")]
    Connect(String),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("too many redirects")]
    RedirectLoop,

    #[error("http error {status}")]
    Http { status: reqwest::StatusCode },

    /// 401/403 from the origin. `headless` holds the failure of the escalated
    /// headless attempt when one was made.
    #[error("access denied (http {status}){}", headless_suffix(.headless))]
    Authorization {
        status: reqwest::StatusCode,
        headless: Option<String>,
    },

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("headless rendering unavailable: {0}")]
    RenderingUnavailable(String),

    #[error("headless rendering failed: {0}")]
    Rendering(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("unknown: {0}")]
    Unknown(String),
}

fn headless_suffix(headless: &Option<String>) -> String {
    match headless {
        Some(reason) => format!("; headless retry failed: {reason}"),
        None => String::new(),
    }
}

impl FetchError {
    /// Maps a non-success status to the error the render controller acts on.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Self::Authorization {
                    status,
                    headless: None,
                }
            }
            _ => Self::Http { status },
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization { .. })
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            }
        } else if err.is_redirect() {
            Self::RedirectLoop
        } else if let Some(status) = err.status() {
            Self::from_status(status)
        } else if err.is_connect() || err.is_request() {
            Self::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Io(err.to_string())
        } else {
            Self::Unknown(err.to_string())
        }
    }
}
