// Page Fetcher
//
// The HTTP layer is a capability the pipeline consumes. Strategies and the
// chain follower only see `PageFetcher`; `HttpFetcher` is the reqwest
// implementation and `MemoryFetcher` replays canned responses.

mod http;
mod memory;

pub use http::HttpFetcher;
pub use memory::{CannedResponse, MemoryFetcher};

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::DEFAULT_TIMEOUT_MS;
use crate::error::FetchError;

/// A single GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub referer: Option<String>,
    /// When false, 3xx responses are returned as-is so the caller can read
    /// their headers.
    pub follow_redirects: bool,
    pub timeout: Duration,
}

impl FetchRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referer: None,
            follow_redirects: true,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    #[must_use]
    pub fn with_referer(mut self, referer: Option<&str>) -> Self {
        self.referer = referer.filter(|r| !r.is_empty()).map(str::to_string);
        self
    }

    #[must_use]
    pub const fn with_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Response of a fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub body: String,
    /// Header names are lower-cased
    pub headers: HashMap<String, String>,
    /// URL after redirects (the request URL when none were followed)
    pub final_url: String,
    pub status: u16,
}

impl FetchedPage {
    /// Stand-in page for strategies that need no network fetch
    #[must_use]
    pub fn synthetic(url: impl Into<String>) -> Self {
        Self {
            final_url: url.into(),
            status: 200,
            ..Self::default()
        }
    }

    /// Case-insensitive header lookup
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// HTTP GET capability with referer and redirect control
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError>;
}

/// Run a fetch under `request.timeout` regardless of how the fetcher is
/// implemented.
pub async fn fetch_with_timeout(
    fetcher: &dyn PageFetcher,
    request: &FetchRequest,
) -> Result<FetchedPage, FetchError> {
    match tokio::time::timeout(request.timeout, fetcher.fetch(request)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: request.url.clone(),
            timeout_ms: u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut page = FetchedPage::synthetic("https://a.test/");
        page.headers
            .insert("location".to_string(), "https://b.test/".to_string());
        assert_eq!(page.header("Location"), Some("https://b.test/"));
        assert_eq!(page.header("hx-redirect"), None);
    }

    #[test]
    fn test_request_builders() {
        let req = FetchRequest::get("https://a.test/")
            .with_referer(Some(""))
            .with_redirects(false)
            .with_timeout(Duration::from_millis(10));
        assert_eq!(req.referer, None);
        assert!(!req.follow_redirects);
        assert_eq!(req.timeout, Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_with_timeout_bounds_slow_fetchers() {
        let fetcher = MemoryFetcher::new().route(
            "https://slow.test/",
            CannedResponse::html("late").with_delay(Duration::from_secs(60)),
        );
        let req = FetchRequest::get("https://slow.test/").with_timeout(Duration::from_secs(1));

        let err = fetch_with_timeout(&fetcher, &req).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Timeout {
                url: "https://slow.test/".to_string(),
                timeout_ms: 1000
            }
        );
    }
}
