//! Page sources: where extractors get their raw markup from.

use crate::error::{Result, SessionError};
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// Anything that can fetch the body of a page.
///
/// Each call is one suspension point; there are no partial results.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `url` and return its body as text.
    async fn fetch_text(&self, url: &Url) -> Result<String>;
}

/// Serves pre-recorded pages instead of touching the network.
///
/// Used to replay saved pages and to drive extraction offline. Unknown URLs
/// answer with HTTP 404.
#[derive(Debug, Default)]
pub struct ReplaySource {
    pages: HashMap<String, String>,
    failures: HashMap<String, u16>,
    requests: Mutex<Vec<String>>,
}

impl ReplaySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    /// Answer `url` with the given HTTP status.
    #[must_use]
    pub fn with_failure(mut self, url: impl Into<String>, status: u16) -> Self {
        self.failures.insert(url.into(), status);
        self
    }

    /// Every URL requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("acquire lock on request log")
            .clone()
    }
}

#[async_trait::async_trait]
impl PageSource for ReplaySource {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        let key = url.as_str();
        self.requests
            .lock()
            .expect("acquire lock on request log")
            .push(key.to_string());

        if let Some(status) = self.failures.get(key) {
            return Err(SessionError::Status {
                url: key.to_string(),
                status: *status,
            });
        }

        self.pages
            .get(key)
            .cloned()
            .ok_or_else(|| SessionError::Status {
                url: key.to_string(),
                status: 404,
            })
    }
}
