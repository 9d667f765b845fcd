//! Thin adapters over third-party content APIs.
//!
//! Every adapter builds a request, parses the expected response shape and
//! normalises it into a small record. Failures never leave the service
//! layer: each service resolves through the shared resilience layer and
//! ends with bundled static content.

pub mod bible;
pub mod calendar;
pub mod firecrawl;
pub mod news;
pub mod quotes;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::resilience::{FetchError, FetchResult};

pub use bible::{BibleService, Passage, Verse};
pub use calendar::{CalendarService, ChristianEvent};
pub use firecrawl::{CrawledPage, FellowshipCrawler, FirecrawlClient, ScrapedResource, SearchHit};
pub use news::{NewsArticle, NewsService};
pub use quotes::{Quote, QuotesService};

/// Builds the HTTP client shared by all integrations
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("fellowship/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Sends `request` and decodes a JSON body, mapping failures onto [`FetchError`]
pub(crate) async fn send_json<T: DeserializeOwned>(
    source_name: &str,
    request: RequestBuilder,
) -> FetchResult<T> {
    let response = request.send().await.map_err(|e| {
        let message = if e.is_timeout() {
            "Request timed out".to_string()
        } else if e.is_connect() {
            "Connection failed".to_string()
        } else {
            e.to_string()
        };
        FetchError::transport(source_name, message)
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            source_name: source_name.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::transport(source_name, e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| FetchError::parse(source_name, e.to_string()))
}
