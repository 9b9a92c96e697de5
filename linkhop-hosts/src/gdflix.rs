//! GDFlix

use std::sync::LazyLock;

use linkhop_core::text::{absolutize, value_after_label};
use linkhop_core::{
    Extraction, FetchedPage, Hop, HopOutcome, RawCandidate, RedirectProbe, SourceFamily, Strategy,
};
use scraper::{Html, Selector};

use crate::classify::{classify, Classifier};
use crate::markup::{element_text, first_href};
use crate::pixeldrain;

static SEL_ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.list-group-item").expect("invalid row selector"));
static SEL_BUTTONS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.text-center a").expect("invalid button selector"));
static SEL_EMBED_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.card-body a").expect("invalid embed selector"));

static CLASSIFIERS: LazyLock<Vec<Classifier>> = LazyLock::new(|| {
    vec![
        Classifier::text("Direct DL", r"(?i)direct\s*(dl|server)", SourceFamily::DirectFileHost),
        Classifier::text("Cloud Download", r"(?i)cloud\s*download", SourceFamily::DirectFileHost),
        Classifier::text("Instant DL", r"(?i)instant\s*dl", SourceFamily::RedirectProxy)
            .with_hop(Hop::RedirectProbe(RedirectProbe::location().until_param("url"))),
        Classifier::href("PixelDrain", r"(?i)pixeldra", SourceFamily::DirectFileHost)
            .with_rewrite(pixeldrain::download_url),
        Classifier::text("Fast Cloud", r"(?i)fast\s*cloud", SourceFamily::DirectFileHost)
            .with_hop(Hop::EmbedPage),
    ]
});

#[derive(Debug, Default, Clone, Copy)]
pub struct GdFlix;

impl Strategy for GdFlix {
    fn name(&self) -> &'static str {
        "GDFlix"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["gdflix"]
    }

    fn extract(&self, page: &FetchedPage) -> Extraction {
        let document = Html::parse_document(&page.body);

        let mut title = None;
        let mut size = None;
        for row in document.select(&SEL_ROWS) {
            let text = element_text(row);
            if title.is_none() {
                title = value_after_label(&text, "Name");
            }
            if size.is_none() {
                size = value_after_label(&text, "Size");
            }
        }

        let candidates = document
            .select(&SEL_BUTTONS)
            .filter_map(|button| {
                let href = absolutize(&page.final_url, button.value().attr("href")?)?;
                Some(classify(&CLASSIFIERS, &element_text(button), &href))
            })
            .collect();

        Extraction {
            title,
            size,
            candidates,
            ..Extraction::default()
        }
    }

    /// "Fast Cloud" opens an intermediate page whose card holds the file link
    fn extract_embed(&self, page: &FetchedPage, candidate: &RawCandidate) -> HopOutcome {
        let document = Html::parse_document(&page.body);
        first_href(&document, &SEL_EMBED_LINK, &page.final_url)
            .map(|url| HopOutcome::single(url, candidate.label.clone()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE_PAGE: &str = r#"
        <ul>
          <li class="list-group-item">Name : Show.S01E01.720p.mkv</li>
          <li class="list-group-item">size : 850 MB</li>
          <li class="list-group-item">Type : video/x-matroska</li>
        </ul>
        <div class="text-center">
          <a href="https://direct.test/f/1.mkv">DIRECT DL</a>
          <a href="https://cloud.test/f/1.mkv">CLOUD DOWNLOAD [R2]</a>
          <a href="https://instant.test/go/1">Instant DL [10GBPS]</a>
          <a href="https://pixeldrain.com/u/p1">PixelDrain DL</a>
          <a href="/zfile/abc">FAST CLOUD / ZIPDISK</a>
          <a href="https://gofile.test/d/1">GoFile [Mirror]</a>
        </div>"#;

    fn page(body: &str, url: &str) -> FetchedPage {
        FetchedPage {
            body: body.to_string(),
            final_url: url.to_string(),
            status: 200,
            ..FetchedPage::default()
        }
    }

    #[test]
    fn test_label_rows() {
        let extraction = GdFlix.extract(&page(FILE_PAGE, "https://gdflix.test/file/abc"));
        assert_eq!(extraction.title.as_deref(), Some("Show.S01E01.720p.mkv"));
        assert_eq!(extraction.size.as_deref(), Some("850 MB"));
        assert_eq!(extraction.header, None);
    }

    #[test]
    fn test_button_classification() {
        let extraction = GdFlix.extract(&page(FILE_PAGE, "https://gdflix.test/file/abc"));
        let summary: Vec<_> = extraction
            .candidates
            .iter()
            .map(|c| (c.server.as_str(), c.href.as_str(), c.hop))
            .collect();

        assert_eq!(
            summary,
            [
                ("Direct DL", "https://direct.test/f/1.mkv", Hop::Direct),
                ("Cloud Download", "https://cloud.test/f/1.mkv", Hop::Direct),
                (
                    "Instant DL",
                    "https://instant.test/go/1",
                    Hop::RedirectProbe(RedirectProbe::location().until_param("url"))
                ),
                (
                    "PixelDrain",
                    "https://pixeldrain.com/api/file/p1?download",
                    Hop::Direct
                ),
                ("Fast Cloud", "https://gdflix.test/zfile/abc", Hop::EmbedPage),
                ("GoFile [Mirror]", "https://gofile.test/d/1", Hop::Delegate),
            ]
        );
    }

    #[test]
    fn test_fast_cloud_second_page() {
        let candidate = RawCandidate::new(
            "Fast Cloud",
            "FAST CLOUD",
            "https://gdflix.test/zfile/abc",
            SourceFamily::DirectFileHost,
        );
        let second = page(
            r#"<div class="card-body"><a href="https://fast.test/dl/abc.mkv">Download Now</a></div>"#,
            "https://gdflix.test/zfile/abc",
        );
        let outcome = GdFlix.extract_embed(&second, &candidate);
        assert_eq!(outcome.links.len(), 1);
        assert_eq!(outcome.links[0].url, "https://fast.test/dl/abc.mkv");

        let busy = page("<p>busy</p>", "https://gdflix.test/zfile/abc");
        let empty = GdFlix.extract_embed(&busy, &candidate);
        assert!(empty.links.is_empty());
    }
}
