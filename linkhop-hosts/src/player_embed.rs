//! JW-style player embeds
//!
//! Player pages declare their sources in inline script as object literals,
//! e.g. `sources: [{file: "https://.../master.m3u8", label: "1080p"}]` and
//! `tracks: [{file: "/subs/en.vtt", label: "English", kind: "captions"}]`.
//! Every literal on the page is read, not just the first one.

use std::sync::LazyLock;

use linkhop_core::normalize::{is_adaptive, is_subtitle_url};
use linkhop_core::text::{absolutize, unescape_link};
use linkhop_core::{
    Extraction, FetchedPage, Hop, HopOutcome, RawCandidate, ResolvedLink, SourceFamily, Strategy,
    SubtitleDescriptor,
};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

// Brace-free object literals; nested objects are matched from the inside.
static RE_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("invalid object regex"));
static RE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?\bfile["']?\s*:\s*["']([^"']+)["']"#).expect("invalid file regex")
});
static RE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?\blabel["']?\s*:\s*["']([^"']*)["']"#).expect("invalid label regex")
});
static RE_KIND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?\bkind["']?\s*:\s*["']([^"']+)["']"#).expect("invalid kind regex")
});
static RE_BARE_PLAYLIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bfile["']?\s*:\s*["']([^"']+\.m3u8[^"']*)["']"#)
        .expect("invalid playlist regex")
});
static SEL_IFRAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("iframe[src]").expect("invalid iframe selector"));

const SUBTITLE_KINDS: &[&str] = &["captions", "subtitles"];

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
}

/// Sources and tracks declared in a player page's script
#[derive(Debug, Default, PartialEq, Eq)]
struct Sources {
    links: Vec<ResolvedLink>,
    subtitles: Vec<SubtitleDescriptor>,
}

fn scan_sources(body: &str, base: &str) -> Sources {
    let mut sources = Sources::default();

    for object in RE_OBJECT.find_iter(body).map(|m| m.as_str()) {
        let Some(url) = capture(&RE_FILE, object)
            .and_then(|file| absolutize(base, &unescape_link(file)))
        else {
            continue;
        };
        let label = capture(&RE_LABEL, object).filter(|l| !l.is_empty());

        let is_subtitle = match capture(&RE_KIND, object).map(str::to_ascii_lowercase) {
            Some(kind) if SUBTITLE_KINDS.contains(&kind.as_str()) => true,
            // thumbnails, chapters
            Some(_) => continue,
            // players default kind-less tracks to captions
            None => is_subtitle_url(&url),
        };

        if is_subtitle {
            sources
                .subtitles
                .push(SubtitleDescriptor::new(url, label.unwrap_or("Unknown")));
        } else {
            sources.links.push(ResolvedLink {
                url,
                label: label.map(str::to_string),
            });
        }
    }

    if sources.links.is_empty() {
        if let Some(url) = capture(&RE_BARE_PLAYLIST, body)
            .and_then(|file| absolutize(base, &unescape_link(file)))
        {
            sources.links.push(ResolvedLink { url, label: None });
        }
    }

    sources
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlayerEmbed;

impl Strategy for PlayerEmbed {
    fn name(&self) -> &'static str {
        "PlayerEmbed"
    }

    fn domains(&self) -> &'static [&'static str] {
        &["streamwish", "vidhide", "filelions", "embedplayer"]
    }

    fn extract(&self, page: &FetchedPage) -> Extraction {
        let server = host_of(&page.final_url);
        let Sources { links, subtitles } = scan_sources(&page.body, &page.final_url);

        let mut candidates: Vec<RawCandidate> = links
            .into_iter()
            .map(|link| {
                let family = if is_adaptive(&link.url) {
                    SourceFamily::AdaptiveStreamEmbed
                } else {
                    SourceFamily::DirectFileHost
                };
                let display_text = link.label.clone().unwrap_or_default();
                RawCandidate::new(server.as_str(), display_text, link.url, family)
                    .with_hop(Hop::Direct)
                    .with_label(link.label)
            })
            .collect();

        let document = Html::parse_document(&page.body);
        candidates.extend(
            document
                .select(&SEL_IFRAME)
                .filter_map(|frame| absolutize(&page.final_url, frame.value().attr("src")?))
                .map(|src| {
                    let server = host_of(&src);
                    RawCandidate::new(server, "embed", src, SourceFamily::AdaptiveStreamEmbed)
                }),
        );

        Extraction {
            candidates,
            subtitles,
            ..Extraction::default()
        }
    }

    fn extract_embed(&self, page: &FetchedPage, _candidate: &RawCandidate) -> HopOutcome {
        let Sources { links, subtitles } = scan_sources(&page.body, &page.final_url);
        HopOutcome { links, subtitles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: &str = r#"
        <html><body><div id="player"></div>
        <script>
          jwplayer("player").setup({
            sources: [{file:"https:\/\/cdn.test\/hls\/master.m3u8?t=1",label:"1080p"},
                      {"file": "https://cdn.test/v/720.mp4", "label": "720p"}],
            tracks: [{file: "/subs/en.vtt", label: "English", kind: "captions"},
                     {file: "/thumbs.vtt", kind: "thumbnails"}],
            image: "https://cdn.test/poster.jpg"
          });
        </script></body></html>"#;

    fn page(body: &str) -> FetchedPage {
        FetchedPage {
            body: body.to_string(),
            final_url: "https://streamwish.test/e/abc".to_string(),
            status: 200,
            ..FetchedPage::default()
        }
    }

    #[test]
    fn test_reads_every_source_literal() {
        let extraction = PlayerEmbed.extract(&page(PLAYER));

        let summary: Vec<_> = extraction
            .candidates
            .iter()
            .map(|c| (c.href.as_str(), c.label.as_deref(), c.family, c.hop))
            .collect();
        assert_eq!(
            summary,
            [
                (
                    "https://cdn.test/hls/master.m3u8?t=1",
                    Some("1080p"),
                    SourceFamily::AdaptiveStreamEmbed,
                    Hop::Direct
                ),
                (
                    "https://cdn.test/v/720.mp4",
                    Some("720p"),
                    SourceFamily::DirectFileHost,
                    Hop::Direct
                ),
            ]
        );
        assert_eq!(extraction.candidates[0].server, "streamwish.test");
        assert_eq!(
            extraction.subtitles,
            vec![SubtitleDescriptor::new("https://streamwish.test/subs/en.vtt", "English")]
        );
    }

    #[test]
    fn test_bare_playlist_fallback() {
        let body = r#"<script>var player = new Clappr.Player({
            source: x, file: "https://cdn.test/live/index.m3u8", parent: p, plugins: {a: 1}
        })</script>"#;
        let sources = scan_sources(body, "https://vidhide.test/v/1");
        assert_eq!(
            sources.links,
            vec![ResolvedLink {
                url: "https://cdn.test/live/index.m3u8".to_string(),
                label: None
            }]
        );
    }

    #[test]
    fn test_iframe_becomes_embed_hop() {
        let body = r#"<iframe src="//filelions.test/v/xyz" allowfullscreen></iframe>"#;
        let extraction = PlayerEmbed.extract(&page(body));
        assert_eq!(extraction.candidates.len(), 1);
        let frame = &extraction.candidates[0];
        assert_eq!(frame.href, "https://filelions.test/v/xyz");
        assert_eq!(frame.hop, Hop::EmbedPage);
        assert_eq!(frame.server, "filelions.test");
    }

    #[test]
    fn test_embed_pass_scans_second_page() {
        let candidate = RawCandidate::new(
            "x",
            "embed",
            "https://filelions.test/v/xyz",
            SourceFamily::AdaptiveStreamEmbed,
        );
        let outcome = PlayerEmbed.extract_embed(&page(PLAYER), &candidate);
        assert_eq!(outcome.links.len(), 2);
        assert_eq!(outcome.subtitles.len(), 1);
    }

    #[test]
    fn test_kindless_track_is_subtitle() {
        let body = r#"<script>setup({sources:[{file:"https://cdn.test/v/1.mp4",label:"720p"}],
            tracks:[{file:"https://cdn.test/subs/en.vtt",label:"English"}]});</script>"#;
        let extraction = PlayerEmbed.extract(&page(body));

        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(extraction.candidates[0].href, "https://cdn.test/v/1.mp4");
        assert_eq!(
            extraction.subtitles,
            vec![SubtitleDescriptor::new("https://cdn.test/subs/en.vtt", "English")]
        );
    }

    #[test]
    fn test_page_without_player() {
        assert!(PlayerEmbed.extract(&page("<html><p>File was deleted</p></html>")).is_empty());
    }
}
