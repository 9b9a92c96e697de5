// Resolve Context
//
// Everything a strategy may touch while resolving one request

use crate::config::ResolveConfig;
use crate::error::FetchError;
use crate::fetch::{fetch_with_timeout, FetchRequest, FetchedPage, PageFetcher};
use crate::model::ResolutionRequest;

/// Per-request execution context
///
/// Borrowed for the duration of one resolution call; strategies never own
/// the fetcher or the configuration.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Request being resolved
    pub request: &'a ResolutionRequest,

    /// HTTP capability
    pub fetcher: &'a dyn PageFetcher,

    /// Caller configuration
    pub config: &'a ResolveConfig,
}

impl<'a> ResolveContext<'a> {
    #[must_use]
    pub const fn new(
        request: &'a ResolutionRequest,
        fetcher: &'a dyn PageFetcher,
        config: &'a ResolveConfig,
    ) -> Self {
        Self {
            request,
            fetcher,
            config,
        }
    }

    /// Fetch any URL under the configured timeout
    pub async fn fetch(
        &self,
        url: &str,
        referer: Option<&str>,
        follow_redirects: bool,
    ) -> Result<FetchedPage, FetchError> {
        let request = FetchRequest::get(url)
            .with_referer(referer)
            .with_redirects(follow_redirects)
            .with_timeout(self.config.timeout());
        fetch_with_timeout(self.fetcher, &request).await
    }

    /// Fetch a page on behalf of the request: caller referer and the
    /// configured redirect policy.
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.fetch(url, self.request.referer(), self.config.follow_redirects)
            .await
    }
}
