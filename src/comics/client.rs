//! Client for the external comic metadata source.

use tracing::{debug, instrument, warn};

use crate::error::UpstreamError;
use crate::metrics;

use super::types::Comic;

/// Default metadata source.
pub const DEFAULT_UPSTREAM_URL: &str = "https://xkcd.com";

/// HTTP client for the comic metadata source.
///
/// No request timeout is set; a fetch waits until the transport gives up.
#[derive(Debug, Clone)]
pub struct ComicClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL, without trailing slash.
    base_url: String,
}

impl ComicClient {
    /// Create a client for the given base URL.
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Metadata URL for one comic.
    pub fn comic_url(&self, num: i64) -> String {
        format!("{}/{}/info.0.json", self.base_url, num)
    }

    /// Fetch the metadata of one comic.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn fetch(&self, num: i64) -> Result<Comic, UpstreamError> {
        let timer = metrics::timer_upstream_fetch();

        let result = self.fetch_inner(num).await;

        match &result {
            Ok(comic) => {
                metrics::inc_upstream_fetches("ok");
                debug!(
                    title = %comic.title,
                    month = %comic.month,
                    elapsed_ms = timer.elapsed_ms(),
                    "Fetched comic"
                );
            }
            Err(e) => {
                metrics::inc_upstream_fetches("error");
                warn!(error = %e, "Comic fetch failed");
            }
        }

        result
    }

    async fn fetch_inner(&self, num: i64) -> Result<Comic, UpstreamError> {
        let response = self
            .http
            .get(self.comic_url(num))
            .send()
            .await
            .map_err(|source| UpstreamError::Request { num, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status { num, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| UpstreamError::Body { num, source })?;

        serde_json::from_slice(&body).map_err(|source| UpstreamError::Parse { num, source })
    }
}
