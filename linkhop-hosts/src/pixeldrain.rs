//! PixelDrain file store
//!
//! Links are turned into the file API download URL without fetching the page.
//! The same rewrite is used when a PixelDrain button shows up on another
//! host's page.

use std::sync::LazyLock;

use linkhop_core::text::origin;
use linkhop_core::{Extraction, FetchedPage, RawCandidate, SourceFamily, Strategy};
use regex::Regex;
use url::Url;

/// Short mirror that does not serve the API itself
const SHORT_MIRROR: &str = "pixeldra.in";
const SHORT_MIRROR_API: &str = "https://pixeldrain.com";

// Tried in order; the first shape that matches gives the file ID.
// `/file/` also covers `/api/file/` links.
static RE_ID_SHAPES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"/u/([A-Za-z0-9_-]+)", r"/file/([A-Za-z0-9_-]+)"]
        .into_iter()
        .map(|shape| Regex::new(shape).expect("invalid pixeldrain id regex"))
        .collect()
});

/// File ID from any known link shape
#[must_use]
pub fn file_id(link: &str) -> Option<&str> {
    RE_ID_SHAPES
        .iter()
        .find_map(|shape| shape.captures(link))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// API origin for a link: its own origin, except the short mirror
#[must_use]
pub fn api_base(link: &str) -> Option<String> {
    let host = Url::parse(link).ok()?.host_str()?.to_ascii_lowercase();
    if host == SHORT_MIRROR {
        Some(SHORT_MIRROR_API.to_string())
    } else {
        origin(link)
    }
}

/// `{api_base}/api/file/{id}?download`.
///
/// Links that already are download links, or that match no known shape, are
/// returned unchanged.
#[must_use]
pub fn download_url(link: &str) -> String {
    if link.contains("download") {
        return link.to_string();
    }
    match (file_id(link), api_base(link)) {
        (Some(id), Some(base)) => format!("{base}/api/file/{id}?download"),
        _ => link.to_string(),
    }
}

/// Strategy for links pointing straight at PixelDrain
#[derive(Debug, Default, Clone, Copy)]
pub struct PixelDrain;

impl Strategy for PixelDrain {
    fn name(&self) -> &'static str {
        "PixelDrain"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["pixeldrain", "pixeldra.in"]
    }

    fn requires_page(&self) -> bool {
        false
    }

    fn extract(&self, page: &FetchedPage) -> Extraction {
        let link = download_url(&page.final_url);
        Extraction {
            candidates: vec![RawCandidate::new(
                "",
                "PixelDrain",
                link,
                SourceFamily::DirectFileHost,
            )],
            ..Extraction::default()
        }
    }
}
