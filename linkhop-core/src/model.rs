// Resolution Data Model
//
// Every value here lives for a single resolution call.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::quality::QualityRank;

/// Input to a resolution call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRequest {
    /// Page URL to resolve
    pub page_url: String,

    /// Referer supplied by the caller (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
}

impl ResolutionRequest {
    #[must_use]
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            referer: None,
        }
    }

    #[must_use]
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Referer if present and non-empty
    #[must_use]
    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref().filter(|r| !r.trim().is_empty())
    }
}

/// Backend type a candidate link belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFamily {
    /// File store whose link (possibly rewritten) is directly playable
    DirectFileHost,
    /// Proxy that answers with a redirect header pointing at the file
    RedirectProxy,
    /// Player page that declares playlist or file/label sources in script
    AdaptiveStreamEmbed,
    /// Not recognized by the strategy; handed to generic delegation
    GenericFallback,
}

impl SourceFamily {
    /// Hop used when a classifier does not override it
    #[must_use]
    pub const fn default_hop(self) -> Hop {
        match self {
            Self::DirectFileHost => Hop::Direct,
            Self::RedirectProxy => Hop::RedirectProbe(RedirectProbe::location()),
            Self::AdaptiveStreamEmbed => Hop::EmbedPage,
            Self::GenericFallback => Hop::Delegate,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DirectFileHost => "direct-file-host",
            Self::RedirectProxy => "redirect-proxy",
            Self::AdaptiveStreamEmbed => "adaptive-stream-embed",
            Self::GenericFallback => "generic-fallback",
        }
    }
}

impl fmt::Display for SourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A redirect-only probe: fetch without following redirects and read a
/// response header as the next URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectProbe {
    /// Header carrying the target (lower-case), e.g. "location"
    pub header: &'static str,
    /// Appended to the candidate link before the first probe, e.g. "/download"
    pub path_suffix: Option<&'static str>,
    /// Keep probing until a target carries `{param}=`, then take its value
    pub stop_param: Option<&'static str>,
    /// Resolve relative header values against the probed URL
    pub join_base: bool,
}

impl RedirectProbe {
    #[must_use]
    pub const fn location() -> Self {
        Self::header("location")
    }

    #[must_use]
    pub const fn header(header: &'static str) -> Self {
        Self {
            header,
            path_suffix: None,
            stop_param: None,
            join_base: true,
        }
    }

    #[must_use]
    pub const fn with_path_suffix(mut self, suffix: &'static str) -> Self {
        self.path_suffix = Some(suffix);
        self
    }

    #[must_use]
    pub const fn until_param(mut self, param: &'static str) -> Self {
        self.stop_param = Some(param);
        self
    }
}

/// How a candidate becomes one or more direct URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hop {
    /// `href` already is the direct URL
    Direct,
    /// Follow redirect headers by hand
    RedirectProbe(RedirectProbe),
    /// Fetch the embed target and run the strategy's second extraction pass
    EmbedPage,
    /// Hand to generic best-effort resolution
    Delegate,
}

/// A link found on a page before it is confirmed playable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    /// Server label used in the source label, e.g. "FSL Server"
    pub server: String,
    /// Visible text of the link/button
    pub display_text: String,
    /// Link or embed target
    pub href: String,
    pub family: SourceFamily,
    pub hop: Hop,
    /// Per-candidate label (e.g. "720p" from a file/label pair)
    pub label: Option<String>,
}

impl RawCandidate {
    pub fn new(
        server: impl Into<String>,
        display_text: impl Into<String>,
        href: impl Into<String>,
        family: SourceFamily,
    ) -> Self {
        Self {
            server: server.into(),
            display_text: display_text.into(),
            href: href.into(),
            family,
            hop: family.default_hop(),
            label: None,
        }
    }

    #[must_use]
    pub const fn with_hop(mut self, hop: Hop) -> Self {
        self.hop = hop;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }
}

/// A URL produced by a hop, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLink {
    /// May be empty when a probe found nothing; the normalizer drops it
    pub url: String,
    pub label: Option<String>,
}

/// Result of following one candidate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HopOutcome {
    pub links: Vec<ResolvedLink>,
    pub subtitles: Vec<SubtitleDescriptor>,
}

impl HopOutcome {
    #[must_use]
    pub fn single(url: impl Into<String>, label: Option<String>) -> Self {
        Self {
            links: vec![ResolvedLink {
                url: url.into(),
                label,
            }],
            subtitles: Vec::new(),
        }
    }
}

/// A playable stream returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Strategy and server, e.g. "HubCloud [FSL Server]"
    pub source_label: String,
    /// Source label plus file name and size when known
    pub display_name: String,
    /// Absolute http(s) URL
    pub direct_url: String,
    /// Referer the player should send
    pub referer: String,
    pub quality: QualityRank,
    /// HLS/DASH playlist rather than a single file
    pub is_adaptive: bool,
    pub family: SourceFamily,
}

/// A subtitle track, emitted independently of streams
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubtitleDescriptor {
    pub url: String,
    /// Language or free-text label
    pub label: String,
}

impl SubtitleDescriptor {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// One candidate that failed while its siblings continued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFailure {
    /// Position of the candidate on its page
    pub index: usize,
    pub server: String,
    pub url: String,
    pub reason: String,
}

/// Output channels of a resolution call
pub trait ResolutionSink: Send {
    fn on_stream(&mut self, stream: StreamDescriptor);

    fn on_subtitle(&mut self, subtitle: SubtitleDescriptor);

    fn on_failure(&mut self, _failure: CandidateFailure) {}
}

/// Collected output of a resolution call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub streams: Vec<StreamDescriptor>,
    pub subtitles: Vec<SubtitleDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CandidateFailure>,
}

impl Resolution {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty() && self.subtitles.is_empty()
    }

    /// Stable sort, best quality first; page order is kept within a rank
    pub fn rank_by_quality(&mut self) {
        self.streams.sort_by(|a, b| b.quality.cmp(&a.quality));
    }
}

impl ResolutionSink for Resolution {
    fn on_stream(&mut self, stream: StreamDescriptor) {
        self.streams.push(stream);
    }

    fn on_subtitle(&mut self, subtitle: SubtitleDescriptor) {
        self.subtitles.push(subtitle);
    }

    fn on_failure(&mut self, failure: CandidateFailure) {
        self.failures.push(failure);
    }
}
