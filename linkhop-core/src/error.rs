// Resolution Error Types
//
// "Pattern not found" is never an error here: extraction helpers return
// `Option` and an empty page resolves to an empty `Resolution`.

use thiserror::Error;

/// Errors raised by a `PageFetcher`.
///
/// On the initial page fetch these are fatal to the whole request; on a
/// candidate hop they are recorded as a `CandidateFailure` and siblings
/// continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP error {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Response too large ({size} bytes, max {limit})")]
    ResponseTooLarge { size: u64, limit: usize },

    #[error("No recorded response for {0}")]
    NotFound(String),
}

impl FetchError {
    /// URL the failed request was sent to, when known
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Timeout { url, .. } | Self::Http { url, .. } | Self::Network { url, .. } => {
                Some(url)
            }
            Self::InvalidUrl(url) | Self::NotFound(url) => Some(url),
            Self::ResponseTooLarge { .. } => None,
        }
    }
}

/// Errors that fail a whole resolution request
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    #[error("Referer required to resolve {0}")]
    MissingReferer(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_timeout() {
        let err = FetchError::Timeout {
            url: "https://example.com/a".to_string(),
            timeout_ms: 15000,
        };
        assert_eq!(
            err.to_string(),
            "Request to https://example.com/a timed out after 15000 ms"
        );
    }

    #[test]
    fn test_error_display_http() {
        let err = FetchError::Http {
            status: 404,
            url: "https://example.com/api".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 404 for https://example.com/api");
    }

    #[test]
    fn test_error_display_unsupported() {
        let err = ResolveError::UnsupportedUrl("https://nowhere.test/x".to_string());
        assert_eq!(err.to_string(), "Unsupported URL: https://nowhere.test/x");
    }

    #[test]
    fn test_fetch_error_is_transparent() {
        let err: ResolveError = FetchError::InvalidUrl("::".to_string()).into();
        assert_eq!(err.to_string(), "Invalid URL: ::");
        assert!(matches!(err, ResolveError::Fetch(_)));
    }

    #[test]
    fn test_fetch_error_url() {
        let err = FetchError::Network {
            url: "https://a.test/".to_string(),
            message: "reset".to_string(),
        };
        assert_eq!(err.url(), Some("https://a.test/"));
        assert_eq!(FetchError::ResponseTooLarge { size: 1, limit: 0 }.url(), None);
    }
}
