//! Stream Normalizer
//!
//! Builds caller-facing descriptors from hop output: labels, quality,
//! playlist detection, the absolute-URL check and exact-duplicate removal.

use std::collections::HashSet;

use url::Url;

use crate::model::{RawCandidate, ResolvedLink, SourceFamily, StreamDescriptor, SubtitleDescriptor};
use crate::quality::QualityRank;
use crate::text::{absolutize, is_absolute_http};

const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mkv", "m3u8", "webm", "avi", "mov", "mpd"];
const SUBTITLE_EXTENSIONS: &[&str] = &["vtt", "srt", "ass", "ttml"];

/// Page-level facts shared by every candidate of one page
#[derive(Debug, Clone, Copy)]
pub struct PageMeta<'a> {
    /// Strategy name
    pub strategy: &'a str,
    pub title: Option<&'a str>,
    pub size: Option<&'a str>,
    pub header: Option<&'a str>,
    /// Final URL of the page, base for relative subtitle links
    pub page_url: &'a str,
    /// Referer handed to the player
    pub referer: &'a str,
}

/// `"{strategy} [{server}]"`, or just the strategy when the server is blank
#[must_use]
pub fn source_label(strategy: &str, server: &str) -> String {
    let server = server.trim();
    if server.is_empty() {
        strategy.to_string()
    } else {
        format!("{strategy} [{server}]")
    }
}

/// Source label followed by `[title]` and `[size]` when known
#[must_use]
pub fn display_name(source_label: &str, title: Option<&str>, size: Option<&str>) -> String {
    let mut name = source_label.to_string();
    for part in [title, size].into_iter().flatten() {
        let part = part.trim();
        if !part.is_empty() {
            name.push_str(" [");
            name.push_str(part);
            name.push(']');
        }
    }
    name
}

fn url_path(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase())
        .unwrap_or_else(|_| url.to_ascii_lowercase())
}

/// HLS or DASH playlist
#[must_use]
pub fn is_adaptive(url: &str) -> bool {
    let path = url_path(url);
    path.contains(".m3u8") || path.contains(".mpd")
}

/// Path ends in a known media file extension
#[must_use]
pub fn is_media_url(url: &str) -> bool {
    let path = url_path(url);
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| MEDIA_EXTENSIONS.contains(&ext))
}

/// Path ends in a known subtitle file extension
#[must_use]
pub fn is_subtitle_url(url: &str) -> bool {
    let path = url_path(url);
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| SUBTITLE_EXTENSIONS.contains(&ext))
}

/// Per-page descriptor builder
///
/// Duplicates are only exact `(family, direct_url)` repeats. The same URL
/// offered through two families is kept twice so the caller can choose.
#[derive(Debug, Default)]
pub struct StreamNormalizer {
    seen: HashSet<(SourceFamily, String)>,
    seen_subtitles: HashSet<String>,
}

impl StreamNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the descriptor for one resolved link, or `None` when the link
    /// is not an absolute http(s) URL or was already emitted.
    pub fn stream(
        &mut self,
        meta: &PageMeta<'_>,
        candidate: &RawCandidate,
        link: &ResolvedLink,
    ) -> Option<StreamDescriptor> {
        let url = link.url.trim();
        if !is_absolute_http(url) {
            return None;
        }

        let label = link.label.as_deref().or(candidate.label.as_deref());
        let quality = QualityRank::first_of(
            [label, meta.title, meta.header, Some(candidate.display_text.as_str())]
                .into_iter()
                .flatten(),
        );

        let source_label = source_label(meta.strategy, &candidate.server);
        let display_name = display_name(&source_label, meta.title, meta.size);

        self.admit(StreamDescriptor {
            source_label,
            display_name,
            direct_url: url.to_string(),
            referer: meta.referer.to_string(),
            quality,
            is_adaptive: is_adaptive(url),
            family: candidate.family,
        })
    }

    /// Pass an already-built descriptor through the duplicate filter
    pub fn admit(&mut self, stream: StreamDescriptor) -> Option<StreamDescriptor> {
        self.seen
            .insert((stream.family, stream.direct_url.clone()))
            .then_some(stream)
    }

    /// Absolutize against the page and drop repeats by URL
    pub fn subtitle(
        &mut self,
        meta: &PageMeta<'_>,
        subtitle: SubtitleDescriptor,
    ) -> Option<SubtitleDescriptor> {
        let url = absolutize(meta.page_url, &subtitle.url)?;
        if !is_absolute_http(&url) || !self.seen_subtitles.insert(url.clone()) {
            return None;
        }
        Some(SubtitleDescriptor {
            url,
            label: subtitle.label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta<'a>(title: Option<&'a str>, header: Option<&'a str>) -> PageMeta<'a> {
        PageMeta {
            strategy: "HubCloud",
            title,
            size: Some("1.4 GB"),
            header,
            page_url: "https://hubcloud.test/drive/1",
            referer: "https://hubcloud.test/drive/1",
        }
    }

    fn link(url: &str) -> ResolvedLink {
        ResolvedLink {
            url: url.to_string(),
            label: None,
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(source_label("GDFlix", "Instant DL"), "GDFlix [Instant DL]");
        assert_eq!(source_label("PixelDrain", ""), "PixelDrain");
        assert_eq!(
            display_name("HubCloud [FSL Server]", Some("Movie.mkv"), Some("2 GB")),
            "HubCloud [FSL Server] [Movie.mkv] [2 GB]"
        );
        assert_eq!(display_name("HubCloud", None, Some(" ")), "HubCloud");
    }

    #[test]
    fn test_quality_precedence() {
        let mut normalizer = StreamNormalizer::new();
        let candidate =
            RawCandidate::new("FSL Server", "Download 480p", "", SourceFamily::DirectFileHost);

        let titled = meta(Some("Movie.2160p.mkv"), Some("Movie 720p"));
        let from_title = normalizer
            .stream(&titled, &candidate, &link("https://cdn.test/1"))
            .unwrap();
        assert_eq!(from_title.quality, QualityRank::P2160);

        let headed = meta(Some("Movie.mkv"), Some("Movie 720p"));
        let from_header = normalizer
            .stream(&headed, &candidate, &link("https://cdn.test/2"))
            .unwrap();
        assert_eq!(from_header.quality, QualityRank::P720);

        let from_text = normalizer
            .stream(&meta(None, None), &candidate, &link("https://cdn.test/3"))
            .unwrap();
        assert_eq!(from_text.quality, QualityRank::P480);

        let labelled = ResolvedLink {
            url: "https://cdn.test/4".to_string(),
            label: Some("1080P".to_string()),
        };
        let from_label = normalizer
            .stream(&meta(Some("Movie.2160p.mkv"), None), &candidate, &labelled)
            .unwrap();
        assert_eq!(from_label.quality, QualityRank::P1080);
    }

    #[test]
    fn test_unknown_quality_when_nothing_matches() {
        let mut normalizer = StreamNormalizer::new();
        let candidate =
            RawCandidate::new("S3 Server", "S3 Server", "", SourceFamily::DirectFileHost);
        let stream = normalizer
            .stream(&meta(Some("Movie.mkv"), None), &candidate, &link("https://cdn.test/m.mkv"))
            .unwrap();
        assert_eq!(stream.quality, QualityRank::Unknown);
        assert_eq!(stream.display_name, "HubCloud [S3 Server] [Movie.mkv] [1.4 GB]");
        assert_eq!(stream.referer, "https://hubcloud.test/drive/1");
    }

    #[test]
    fn test_drops_unresolvable_urls() {
        let mut normalizer = StreamNormalizer::new();
        let candidate = RawCandidate::new("X", "X", "", SourceFamily::RedirectProxy);
        for url in ["", "/relative/path.mkv", "ftp://files.test/a.mkv", "magnet:?xt=abc"] {
            assert!(normalizer.stream(&meta(None, None), &candidate, &link(url)).is_none());
        }
    }

    #[test]
    fn test_dedup_is_per_family() {
        let mut normalizer = StreamNormalizer::new();
        let direct = RawCandidate::new("A", "A", "", SourceFamily::DirectFileHost);
        let proxy = RawCandidate::new("B", "B", "", SourceFamily::RedirectProxy);
        let m = meta(None, None);
        let url = link("https://cdn.test/same.mkv");

        assert!(normalizer.stream(&m, &direct, &url).is_some());
        assert!(normalizer.stream(&m, &direct, &url).is_none());
        assert!(normalizer.stream(&m, &proxy, &url).is_some());
    }

    #[test]
    fn test_adaptive_and_media_detection() {
        assert!(is_adaptive("https://cdn.test/hls/master.m3u8?token=1"));
        assert!(is_adaptive("https://cdn.test/dash/manifest.MPD"));
        assert!(!is_adaptive("https://cdn.test/file.mkv?name=x.m3u8"));
        assert!(is_media_url("https://cdn.test/a/Movie.MKV"));
        assert!(is_media_url("https://cdn.test/a/movie.mov?x=1"));
        assert!(!is_media_url("https://host.test/file/abc"));
        assert!(!is_media_url("https://host.test/page.html"));
        assert!(is_subtitle_url("https://cdn.test/subs/en.VTT?t=1"));
        assert!(is_subtitle_url("https://cdn.test/subs/fr.srt"));
        assert!(!is_subtitle_url("https://cdn.test/a/movie.mkv"));
    }

    #[test]
    fn test_subtitles_absolutized_and_deduped() {
        let mut normalizer = StreamNormalizer::new();
        let m = meta(None, None);
        let first = normalizer
            .subtitle(&m, SubtitleDescriptor::new("/subs/en.vtt", "English"))
            .unwrap();
        assert_eq!(first.url, "https://hubcloud.test/subs/en.vtt");
        assert!(normalizer
            .subtitle(&m, SubtitleDescriptor::new("https://hubcloud.test/subs/en.vtt", "English"))
            .is_none());
    }
}
