//! In-memory `PageFetcher` that replays canned responses by URL.
//!
//! Used to resolve captured pages offline and to mock the network in tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{FetchRequest, FetchedPage, PageFetcher};
use crate::error::FetchError;
use crate::text::absolutize;

const MAX_REPLAY_REDIRECTS: usize = 10;

/// A recorded response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
    pub delay: Option<Duration>,
}

impl CannedResponse {
    /// 200 with an HTML body
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            headers: HashMap::new(),
            delay: None,
        }
    }

    /// 302 with a `Location` header
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::status(302).with_header("location", location)
    }

    /// Empty body with the given status
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            headers: HashMap::new(),
            delay: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    const fn is_redirect(&self) -> bool {
        self.status >= 300 && self.status < 400
    }
}

/// Replay fetcher keyed by exact URL
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    routes: HashMap<String, CannedResponse>,
    served: Mutex<Vec<FetchRequest>>,
}

impl MemoryFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response for a URL
    #[must_use]
    pub fn route(mut self, url: impl Into<String>, response: CannedResponse) -> Self {
        self.routes.insert(url.into(), response);
        self
    }

    /// Requests served so far, in arrival order
    #[must_use]
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.served.lock().clone()
    }

    fn lookup(&self, url: &str) -> Result<&CannedResponse, FetchError> {
        self.routes
            .get(url)
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

#[async_trait]
impl PageFetcher for MemoryFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        self.served.lock().push(request.clone());

        let mut url = request.url.clone();
        let mut response = self.lookup(&url)?;

        if request.follow_redirects {
            let mut followed = 0;
            while response.is_redirect() {
                let Some(location) = response.headers.get("location") else {
                    break;
                };
                if followed == MAX_REPLAY_REDIRECTS {
                    return Err(FetchError::Network {
                        url: request.url.clone(),
                        message: "too many redirects".to_string(),
                    });
                }
                url = absolutize(&url, location).unwrap_or_else(|| location.clone());
                response = self.lookup(&url)?;
                followed += 1;
            }
        }

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        let is_success = (200..300).contains(&response.status);
        let is_probe_answer = !request.follow_redirects && response.is_redirect();
        if !is_success && !is_probe_answer {
            return Err(FetchError::Http {
                status: response.status,
                url: request.url.clone(),
            });
        }

        Ok(FetchedPage {
            body: response.body.clone(),
            headers: response.headers.clone(),
            final_url: url,
            status: response.status,
        })
    }
}
