//! HubCloud
//!
//! A drive landing page links (via `#download`) to a `hubcloud.php` page that
//! lists one button per backend: direct file stores, a header-redirect proxy,
//! a worker relay chain and PixelDrain.

use std::sync::LazyLock;

use async_trait::async_trait;
use linkhop_core::text::absolutize;
use linkhop_core::{
    Extraction, FetchError, FetchedPage, Hop, RedirectProbe, ResolveContext, SourceFamily,
    Strategy,
};
use scraper::{Html, Selector};
use tracing::debug;

use crate::classify::{classify, Classifier};
use crate::markup::{element_text, first_href, first_text};
use crate::pixeldrain;

static SEL_DOWNLOAD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#download").expect("invalid download selector"));
static SEL_SIZE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("i#size").expect("invalid size selector"));
static SEL_HEADER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.card-header").expect("invalid header selector"));
static SEL_BUTTONS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.card-body a.btn").expect("invalid button selector"));

static CLASSIFIERS: LazyLock<Vec<Classifier>> = LazyLock::new(|| {
    vec![
        Classifier::text("FSL Server", r"(?i)\bfsl\b", SourceFamily::DirectFileHost),
        Classifier::text("Download File", r"(?i)download\s*file", SourceFamily::DirectFileHost),
        Classifier::text("BuzzServer", r"(?i)buzz\s*server", SourceFamily::RedirectProxy).with_hop(
            Hop::RedirectProbe(RedirectProbe::header("hx-redirect").with_path_suffix("/download")),
        ),
        Classifier::href("PixelDrain", r"(?i)pixeldra", SourceFamily::DirectFileHost)
            .with_rewrite(pixeldrain::download_url),
        Classifier::text("S3 Server", r"(?i)s3\s*server", SourceFamily::DirectFileHost),
        Classifier::text("10Gbps", r"(?i)10\s*gbps", SourceFamily::RedirectProxy)
            .with_hop(Hop::RedirectProbe(RedirectProbe::location().until_param("link"))),
    ]
});

const BUTTON_PAGE: &str = "hubcloud.php";

/// Absolute target of the landing page's `#download` link
fn download_page_url(body: &str, base: &str) -> Option<String> {
    let document = Html::parse_document(body);
    first_href(&document, &SEL_DOWNLOAD, base)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HubCloud;

#[async_trait]
impl Strategy for HubCloud {
    fn name(&self) -> &'static str {
        "HubCloud"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["hubcloud"]
    }

    /// Fetch the landing page, then the button page it links to. A landing
    /// page without `#download` is extracted as-is. Both fetches use the
    /// configured redirect policy.
    async fn fetch_page(&self, ctx: &ResolveContext<'_>) -> Result<FetchedPage, FetchError> {
        let landing = ctx.fetch_page(&ctx.request.page_url).await?;
        if landing.final_url.contains(BUTTON_PAGE) {
            return Ok(landing);
        }

        let Some(next) = download_page_url(&landing.body, &landing.final_url) else {
            debug!(url = %landing.final_url, "no #download link on landing page");
            return Ok(landing);
        };
        ctx.fetch(&next, Some(&landing.final_url), ctx.config.follow_redirects)
            .await
    }

    fn extract(&self, page: &FetchedPage) -> Extraction {
        let document = Html::parse_document(&page.body);
        let header = first_text(&document, &SEL_HEADER);

        let candidates = document
            .select(&SEL_BUTTONS)
            .filter_map(|button| {
                let href = absolutize(&page.final_url, button.value().attr("href")?)?;
                Some(classify(&CLASSIFIERS, &element_text(button), &href))
            })
            .collect();

        Extraction {
            title: header.clone(),
            size: first_text(&document, &SEL_SIZE),
            header,
            candidates,
            subtitles: Vec::new(),
        }
    }
}
