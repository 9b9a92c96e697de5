// Extraction Strategy
//
// Core interface every backend family implements

use async_trait::async_trait;
use url::Url;

use crate::context::ResolveContext;
use crate::error::FetchError;
use crate::fetch::FetchedPage;
use crate::model::{HopOutcome, RawCandidate, SubtitleDescriptor};

/// What one pass over a page produced
///
/// Every field is optional in practice: a page where nothing matched yields
/// `Extraction::default()`, which resolves to an empty result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// File name parsed from the page
    pub title: Option<String>,

    /// Human-readable file size, e.g. "1.4 GB"
    pub size: Option<String>,

    /// Page header text (often carries the resolution token)
    pub header: Option<String>,

    /// Candidates in page order
    pub candidates: Vec<RawCandidate>,

    pub subtitles: Vec<SubtitleDescriptor>,
}

impl Extraction {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.subtitles.is_empty()
    }
}

/// Extraction strategy bound to one backend family
///
/// Only `name()`, `domains()` and `extract()` are mandatory. `extract()` and
/// `extract_embed()` are pure: they see a fetched body and never touch the
/// network, so "pattern absent" is an empty result rather than an error.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Name used in source labels and logs (e.g., "HubCloud")
    fn name(&self) -> &'static str;

    /// Domain fragments this strategy owns
    fn domains(&self) -> &'static [&'static str];

    /// Whether this strategy claims `url`
    fn matches(&self, url: &str) -> bool {
        domain_matches(self.domains(), url)
    }

    /// Whether the page URL must be fetched before extraction.
    ///
    /// Strategies that derive everything from the URL itself return false and
    /// receive a synthetic page carrying only `final_url`.
    fn requires_page(&self) -> bool {
        true
    }

    /// Initial fetch. Errors here are fatal to the request.
    async fn fetch_page(&self, ctx: &ResolveContext<'_>) -> Result<FetchedPage, FetchError> {
        if !self.requires_page() {
            return Ok(FetchedPage::synthetic(ctx.request.page_url.as_str()));
        }
        ctx.fetch_page(&ctx.request.page_url).await
    }

    /// Locate candidates and page metadata
    fn extract(&self, page: &FetchedPage) -> Extraction;

    /// Second extraction pass over an embed target fetched for `candidate`
    fn extract_embed(&self, _page: &FetchedPage, _candidate: &RawCandidate) -> HopOutcome {
        HopOutcome::default()
    }
}

/// Case-insensitive domain containment against the URL host.
///
/// Strings that do not parse as URLs are matched as a whole.
#[must_use]
pub fn domain_matches(domains: &[&str], url: &str) -> bool {
    let haystack = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_else(|| url.to_ascii_lowercase());

    domains
        .iter()
        .any(|domain| haystack.contains(&domain.to_ascii_lowercase()))
}
