//! Stream quality ranking

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// `\d{3,4}` followed by `p`/`P`, e.g. "1080p" in "Movie.1080p.WEB.mkv".
static RE_RESOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{3,4})[pP]").expect("invalid resolution regex"));

/// Quality levels, ordered from worst to best.
///
/// `Unknown` sorts lowest so that ranked output puts unlabelled streams last.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum QualityRank {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "240p")]
    P240,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "1440p")]
    P1440,
    #[serde(rename = "2160p")]
    P2160,
}

impl QualityRank {
    /// Bucket a pixel height: exact heights map to their variant, others
    /// round down to the nearest known variant.
    #[must_use]
    pub const fn from_height(height: u32) -> Self {
        match height {
            2160.. => Self::P2160,
            1440..=2159 => Self::P1440,
            1080..=1439 => Self::P1080,
            720..=1079 => Self::P720,
            480..=719 => Self::P480,
            360..=479 => Self::P360,
            240..=359 => Self::P240,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn height(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::P240 => 240,
            Self::P360 => 360,
            Self::P480 => 480,
            Self::P720 => 720,
            Self::P1080 => 1080,
            Self::P1440 => 1440,
            Self::P2160 => 2160,
        }
    }

    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::P240 => "240p",
            Self::P360 => "360p",
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
            Self::P1440 => "1440p",
            Self::P2160 => "2160p",
        }
    }

    /// Parse the first resolution token out of free text.
    ///
    /// Absence of a token yields `Unknown`, never an error.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        RE_RESOLUTION
            .captures(text)
            .and_then(|cap| cap.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .map_or(Self::Unknown, Self::from_height)
    }

    /// Scan texts from most to least specific and return the first known rank.
    pub fn first_of<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts
            .into_iter()
            .map(Self::parse)
            .find(|rank| rank.is_known())
            .unwrap_or_default()
    }
}

impl fmt::Display for QualityRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
