//! Firecrawl web scraping client.
//!
//! Unlike the content sources, every Firecrawl request waits for the rate
//! limiter instead of being skipped, and failures are returned to the
//! caller.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::send_json;
use crate::resilience::{FetchResult, RateLimiter};

const SOURCE_NAME: &str = "firecrawl";

pub const CRAWL_MAX_PAGES: u32 = 20;
pub const CRAWL_MAX_DEPTH: u32 = 3;
pub const CRAWL_EXCLUDE_PATTERNS: &[&str] =
    &["/admin/*", "/private/*", "/api/*", "*.pdf", "*.doc"];
pub const STUDY_SEARCH_MAX_RESULTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Scrape,
    Crawl,
    Search,
    Extract,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Scrape => "scrape",
            Endpoint::Crawl => "crawl",
            Endpoint::Search => "search",
            Endpoint::Extract => "extract",
        }
    }

    /// Options sent with every request to this endpoint unless overridden
    pub fn default_options(self) -> Map<String, Value> {
        let defaults = match self {
            Endpoint::Scrape => json!({
                "pageOptions": {
                    "onlyMainContent": true,
                    "includeHtml": false,
                    "includeMarkdown": true,
                    "includeScreenshots": false,
                    "includeLinks": true,
                    "includeImages": false
                },
                "screenshotOptions": {
                    "fullPage": false,
                    "quality": 80,
                    "format": "png"
                }
            }),
            Endpoint::Crawl => json!({
                "maxPages": 10,
                "maxDepth": 2,
                "followRedirects": true,
                "includeSubdomains": false,
                "excludePatterns": ["/admin/*", "/private/*", "/api/*"]
            }),
            Endpoint::Search => json!({
                "maxResults": 20,
                "includeMetadata": true,
                "sortBy": "relevance"
            }),
            Endpoint::Extract => json!({}),
        };

        match defaults {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Shallow merge: defaults, then caller options, then the target field
pub fn merge_options(
    endpoint: Endpoint,
    options: Option<Value>,
    target: (&str, Value),
) -> Map<String, Value> {
    let mut body = endpoint.default_options();
    if let Some(Value::Object(options)) = options {
        body.extend(options);
    }
    body.insert(target.0.to_string(), target.1);
    body
}

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedResource {
    pub url: String,
    pub title: String,
    pub content: String,
    pub links: Vec<String>,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledPage {
    pub url: String,
    pub title: String,
    pub content: String,
    pub depth: u32,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub relevance: f64,
}

/// Fields pulled out of a Bible study page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BibleStudyInfo {
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub scripture: Value,
    #[serde(default)]
    pub key_points: Value,
    #[serde(default)]
    pub questions: Value,
    #[serde(default)]
    pub prayer: Value,
}

// Wire shapes

#[derive(Debug, Deserialize)]
pub struct PageData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub depth: Option<u32>,
}

impl PageData {
    fn content(&mut self) -> String {
        self.markdown
            .take()
            .or_else(|| self.text.take())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct ScrapeResponse {
    pub data: PageData,
}

#[derive(Debug, Deserialize)]
pub struct CrawlResponse {
    pub data: CrawlData,
}

#[derive(Debug, Deserialize)]
pub struct CrawlData {
    #[serde(default)]
    pub pages: Vec<PageData>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub data: SearchData,
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractResponse {
    pub data: ExtractData,
}

#[derive(Debug, Deserialize)]
pub struct ExtractData {
    #[serde(default)]
    pub extracted: BibleStudyInfo,
}

// =============================================================================
// Client
// =============================================================================

pub struct FirecrawlClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: Arc<RateLimiter>,
}

impl FirecrawlClient {
    /// Returns `None` without an API key; crawling is then unavailable
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        limiter: Arc<RateLimiter>,
    ) -> Option<Self> {
        let api_key = api_key?;
        Some(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            limiter,
        })
    }

    pub fn request_count(&self) -> u64 {
        self.limiter.request_count(SOURCE_NAME)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: Map<String, Value>,
    ) -> FetchResult<T> {
        self.limiter.acquire(SOURCE_NAME).await;

        log::debug!("Firecrawl {} request", endpoint.path());

        let request = self
            .http
            .post(format!("{}/{}", self.base_url, endpoint.path()))
            .bearer_auth(&self.api_key)
            .json(&body);

        send_json(SOURCE_NAME, request).await
    }

    pub async fn scrape_url(&self, url: &str, options: Option<Value>) -> FetchResult<ScrapeResponse> {
        let body = merge_options(Endpoint::Scrape, options, ("url", json!(url)));
        self.request(Endpoint::Scrape, body).await
    }

    pub async fn crawl_website(
        &self,
        url: &str,
        options: Option<Value>,
    ) -> FetchResult<CrawlResponse> {
        let body = merge_options(Endpoint::Crawl, options, ("url", json!(url)));
        self.request(Endpoint::Crawl, body).await
    }

    pub async fn search_content(
        &self,
        query: &str,
        options: Option<Value>,
    ) -> FetchResult<SearchResponse> {
        let body = merge_options(Endpoint::Search, options, ("query", json!(query)));
        self.request(Endpoint::Search, body).await
    }

    pub async fn extract_data(&self, content: &str, rules: Value) -> FetchResult<ExtractResponse> {
        let body = merge_options(
            Endpoint::Extract,
            Some(json!({ "rules": rules })),
            ("content", json!(content)),
        );
        self.request(Endpoint::Extract, body).await
    }
}

// =============================================================================
// Fellowship crawler
// =============================================================================

/// Study-material oriented operations on top of [`FirecrawlClient`]
pub struct FellowshipCrawler {
    client: FirecrawlClient,
}

impl FellowshipCrawler {
    pub fn new(client: FirecrawlClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &FirecrawlClient {
        &self.client
    }

    /// Scrapes each URL in turn; failed URLs are logged and left out
    pub async fn scrape_resources(&self, urls: &[String]) -> Vec<ScrapedResource> {
        let options = json!({
            "pageOptions": {
                "onlyMainContent": true,
                "includeMarkdown": true,
                "includeLinks": true
            }
        });

        let mut resources = Vec::with_capacity(urls.len());
        for url in urls {
            match self.client.scrape_url(url, Some(options.clone())).await {
                Ok(response) => {
                    let mut page = response.data;
                    resources.push(ScrapedResource {
                        url: url.clone(),
                        title: page.title.take().unwrap_or_default(),
                        content: page.content(),
                        links: std::mem::take(&mut page.links),
                        scraped_at: Utc::now(),
                    });
                }
                Err(e) => log::warn!("Failed to scrape {}: {}", url, e),
            }
        }

        resources
    }

    pub async fn crawl_study_materials(&self, base_url: &str) -> FetchResult<Vec<CrawledPage>> {
        let options = json!({
            "maxPages": CRAWL_MAX_PAGES,
            "maxDepth": CRAWL_MAX_DEPTH,
            "excludePatterns": CRAWL_EXCLUDE_PATTERNS,
        });

        let response = self.client.crawl_website(base_url, Some(options)).await?;

        Ok(response
            .data
            .pages
            .into_iter()
            .map(|mut page| CrawledPage {
                content: page.content(),
                url: page.url.unwrap_or_default(),
                title: page.title.unwrap_or_default(),
                depth: page.depth.unwrap_or(0),
                links: page.links,
            })
            .collect())
    }

    pub async fn search_study_topics(
        &self,
        query: &str,
        content: Option<&str>,
    ) -> FetchResult<Vec<SearchHit>> {
        let mut options = json!({ "maxResults": STUDY_SEARCH_MAX_RESULTS });
        if let Some(content) = content {
            options["content"] = json!(content);
        }

        let response = self.client.search_content(query, Some(options)).await?;
        let mut hits = response.data.results;
        hits.truncate(STUDY_SEARCH_MAX_RESULTS as usize);
        Ok(hits)
    }

    pub async fn extract_bible_study_info(&self, content: &str) -> FetchResult<BibleStudyInfo> {
        let rules = json!({
            "title": "Extract the main title or topic",
            "scripture": "Extract Bible references and verses",
            "keyPoints": "Extract main points or takeaways",
            "questions": "Extract discussion questions",
            "prayer": "Extract prayer points or requests"
        });

        let response = self.client.extract_data(content, rules).await?;
        Ok(response.data.extracted)
    }
}
