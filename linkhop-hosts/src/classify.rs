//! Ordered button classifiers
//!
//! A page of download buttons is sorted into backends by testing each button
//! against a fixed list of patterns; the first classifier that matches
//! decides the family, the hop, and any link rewrite. Buttons nobody
//! recognizes go to generic delegation.

use linkhop_core::{Hop, RawCandidate, SourceFamily};
use regex::Regex;

/// Which part of the button a pattern is tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Text,
    Href,
}

pub(crate) struct Classifier {
    server: &'static str,
    field: Field,
    pattern: Regex,
    family: SourceFamily,
    hop: Option<Hop>,
    rewrite: Option<fn(&str) -> String>,
}

impl Classifier {
    /// Match the button's visible text. Only called from `LazyLock`
    /// initializers with literal patterns.
    pub(crate) fn text(server: &'static str, pattern: &str, family: SourceFamily) -> Self {
        Self::new(server, Field::Text, pattern, family)
    }

    /// Match the button's link
    pub(crate) fn href(server: &'static str, pattern: &str, family: SourceFamily) -> Self {
        Self::new(server, Field::Href, pattern, family)
    }

    fn new(server: &'static str, field: Field, pattern: &str, family: SourceFamily) -> Self {
        Self {
            server,
            field,
            pattern: Regex::new(pattern).expect("invalid classifier pattern"),
            family,
            hop: None,
            rewrite: None,
        }
    }

    #[must_use]
    pub(crate) fn with_hop(mut self, hop: Hop) -> Self {
        self.hop = Some(hop);
        self
    }

    #[must_use]
    pub(crate) fn with_rewrite(mut self, rewrite: fn(&str) -> String) -> Self {
        self.rewrite = Some(rewrite);
        self
    }

    fn matches(&self, text: &str, href: &str) -> bool {
        match self.field {
            Field::Text => self.pattern.is_match(text),
            Field::Href => self.pattern.is_match(href),
        }
    }

    fn candidate(&self, text: &str, href: &str) -> RawCandidate {
        let href = self.rewrite.map_or_else(|| href.to_string(), |rewrite| rewrite(href));
        let candidate = RawCandidate::new(self.server, text, href, self.family);
        match self.hop {
            Some(hop) => candidate.with_hop(hop),
            None => candidate,
        }
    }
}

/// Classify one button; unmatched buttons fall through to delegation
pub(crate) fn classify(classifiers: &[Classifier], text: &str, href: &str) -> RawCandidate {
    classifiers
        .iter()
        .find(|classifier| classifier.matches(text, href))
        .map_or_else(
            || RawCandidate::new(text, text, href, SourceFamily::GenericFallback),
            |classifier| classifier.candidate(text, href),
        )
}
