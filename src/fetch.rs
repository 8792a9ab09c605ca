//! This module retrieves feed bodies over HTTP

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::config::FEED_TIMEOUT;
use crate::error::FetchError;
use crate::traits::FeedFetcher;

/// A [`FeedFetcher`] that issues plain GET requests.
///
/// Every request is bounded by a timeout so that one slow external host cannot stall the
/// whole calendar view; a timed-out feed is treated like any other failed feed.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_timeout(FEED_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("cannot build HTTP client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(body)
    }
}
