//! reqwest-backed `PageFetcher`

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::{HeaderMap, REFERER}, redirect::Policy, Client};
use tracing::debug;
use url::Url;

use super::{FetchRequest, FetchedPage, PageFetcher};
use crate::config::ResolveConfig;
use crate::error::FetchError;

/// HTTP fetcher holding two connection pools: one that follows redirects and
/// one that returns 3xx responses untouched for redirect probes.
#[derive(Clone)]
pub struct HttpFetcher {
    following: Client,
    probing: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &ResolveConfig) -> Result<Self, FetchError> {
        Ok(Self {
            following: build_client(config, Policy::limited(10))?,
            probing: build_client(config, Policy::none())?,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

fn build_client(config: &ResolveConfig, policy: Policy) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(Duration::from_secs(10).min(config.timeout()))
        .timeout(config.timeout())
        .pool_max_idle_per_host(10)
        .redirect(policy)
        .build()
        .map_err(|e| FetchError::Network {
            url: String::new(),
            message: format!("failed to build HTTP client: {e}"),
        })
}

fn map_send_error(request: &FetchRequest, err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: request.url.clone(),
            timeout_ms: u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else {
        FetchError::Network {
            url: request.url.clone(),
            message: err.to_string(),
        }
    }
}

/// Lower-cased header names; the first value wins for repeated headers.
fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut collected = HashMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            collected
                .entry(name.as_str().to_ascii_lowercase())
                .or_insert_with(|| value.to_string());
        }
    }
    collected
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        let url =
            Url::parse(&request.url).map_err(|_| FetchError::InvalidUrl(request.url.clone()))?;

        let client = if request.follow_redirects {
            &self.following
        } else {
            &self.probing
        };

        let mut builder = client.get(url).timeout(request.timeout);
        if let Some(referer) = request.referer.as_deref() {
            builder = builder.header(REFERER, referer);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_send_error(request, &e))?;

        let status = response.status();
        let is_probe_answer = !request.follow_redirects && status.is_redirection();
        if !status.is_success() && !is_probe_answer {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: request.url.clone(),
            });
        }

        if let Some(length) = response.content_length() {
            if length > self.max_body_bytes as u64 {
                return Err(FetchError::ResponseTooLarge {
                    size: length,
                    limit: self.max_body_bytes,
                });
            }
        }

        let final_url = response.url().to_string();
        let headers = collect_headers(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_send_error(request, &e))?;
        if bytes.len() > self.max_body_bytes {
            return Err(FetchError::ResponseTooLarge {
                size: bytes.len() as u64,
                limit: self.max_body_bytes,
            });
        }

        debug!(
            url = %request.url,
            final_url = %final_url,
            status = status.as_u16(),
            bytes = bytes.len(),
            "fetched page"
        );

        Ok(FetchedPage {
            body: String::from_utf8_lossy(&bytes).into_owned(),
            headers,
            final_url,
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&ResolveConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_body_and_referer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("referer", "https://from.test/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let url = format!("{}/page", server.uri());
        let req = FetchRequest::get(&url).with_referer(Some("https://from.test/"));
        let page = fetcher().fetch(&req).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html>ok</html>");
        assert_eq!(page.final_url, url);
    }

    #[tokio::test]
    async fn test_probe_returns_location_without_following() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/relay"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "https://cdn.test/file.mkv"),
            )
            .mount(&server)
            .await;

        let req = FetchRequest::get(format!("{}/relay", server.uri())).with_redirects(false);
        let page = fetcher().fetch(&req).await.unwrap();

        assert_eq!(page.status, 302);
        assert_eq!(page.header("location"), Some("https://cdn.test/file.mkv"));
    }

    #[tokio::test]
    async fn test_redirects_followed_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let req = FetchRequest::get(format!("{}/old", server.uri()));
        let page = fetcher().fetch(&req).await.unwrap();

        assert_eq!(page.body, "moved");
        assert_eq!(page.final_url, format!("{}/new", server.uri()));
    }

    #[tokio::test]
    async fn test_non_success_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/gone", server.uri());
        let err = fetcher().fetch(&FetchRequest::get(&url)).await.unwrap_err();
        assert_eq!(err, FetchError::Http { status: 404, url });
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let req = FetchRequest::get(format!("{}/slow", server.uri()))
            .with_timeout(Duration::from_millis(200));
        let err = fetcher().fetch(&req).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { timeout_ms: 200, .. }));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let err = fetcher()
            .fetch(&FetchRequest::get("not a url"))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::InvalidUrl("not a url".to_string()));
    }
}
