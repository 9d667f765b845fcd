use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::send_json;
use crate::resilience::{FetchCache, FetchError, FetchResult, RateLimiter, Sourced};

pub const DEFAULT_NEWS_LIMIT: usize = 5;
pub const MAX_NEWS_LIMIT: usize = 20;

const SOURCE_NAME: &str = "rss2json";
const FALLBACK_SOURCE: &str = "Fellowship of Believers";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: String,
    pub link: String,
    pub published: String,
    /// Hostname of the feed the article came from
    pub source: String,
}

#[derive(Deserialize)]
struct FeedResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    items: Vec<FeedItem>,
}

#[derive(Deserialize)]
struct FeedItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    link: String,
    #[serde(default, rename = "pubDate")]
    pub_date: String,
}

/// One RSS feed read through the rss2json proxy
pub struct RssFeed {
    http: reqwest::Client,
    proxy_url: String,
    feed_url: String,
    host: String,
}

impl RssFeed {
    /// Returns `None` when `feed_url` has no hostname
    pub fn new(http: reqwest::Client, proxy_url: &str, feed_url: &str) -> Option<Self> {
        let host = url::Url::parse(feed_url)
            .ok()?
            .host_str()
            .map(str::to_string)?;

        Some(Self {
            http,
            proxy_url: proxy_url.to_string(),
            feed_url: feed_url.to_string(),
            host,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn rate_key(&self) -> String {
        format!("{}:{}", SOURCE_NAME, self.host)
    }

    /// Fetches at most `take` articles from the feed
    pub async fn fetch(&self, take: usize) -> FetchResult<Vec<NewsArticle>> {
        let request = self
            .http
            .get(&self.proxy_url)
            .query(&[("rss_url", self.feed_url.as_str())]);

        let response: FeedResponse = send_json(SOURCE_NAME, request).await?;
        if !response.status.is_empty() && response.status != "ok" {
            return Err(FetchError::parse(
                SOURCE_NAME,
                response
                    .message
                    .unwrap_or_else(|| format!("feed status {}", response.status)),
            ));
        }

        Ok(response
            .items
            .into_iter()
            .take(take)
            .map(|item| NewsArticle {
                title: item.title,
                description: item.description,
                link: item.link,
                published: item.pub_date,
                source: self.host.clone(),
            })
            .collect())
    }
}

pub fn fallback_articles() -> Vec<NewsArticle> {
    let now = Utc::now().to_rfc3339();
    vec![
        NewsArticle {
            title: "Building Authentic Christian Fellowship".to_string(),
            description:
                "Discover how to create meaningful relationships in your Christian community."
                    .to_string(),
            link: "#".to_string(),
            published: now.clone(),
            source: FALLBACK_SOURCE.to_string(),
        },
        NewsArticle {
            title: "The Power of Small Group Bible Study".to_string(),
            description:
                "Learn how intimate Bible study groups can transform your spiritual life."
                    .to_string(),
            link: "#".to_string(),
            published: now,
            source: FALLBACK_SOURCE.to_string(),
        },
    ]
}

/// Aggregates the configured feeds.
///
/// Each feed contributes `ceil(limit / 2)` articles and the merged list is
/// truncated to `limit`. A failing feed contributes nothing.
pub struct NewsService {
    feeds: Vec<RssFeed>,
    limiter: Arc<RateLimiter>,
    cache: FetchCache<Vec<NewsArticle>>,
}

impl NewsService {
    pub fn new(
        http: reqwest::Client,
        proxy_url: &str,
        feed_urls: &[String],
        limiter: Arc<RateLimiter>,
        ttl: Duration,
    ) -> Self {
        let feeds = feed_urls
            .iter()
            .filter_map(|url| {
                let feed = RssFeed::new(http.clone(), proxy_url, url);
                if feed.is_none() {
                    log::warn!("Ignoring news feed without a hostname: {}", url);
                }
                feed
            })
            .collect();

        Self {
            feeds,
            limiter,
            cache: FetchCache::new(ttl),
        }
    }

    pub fn feed_hosts(&self) -> Vec<&str> {
        self.feeds.iter().map(RssFeed::host).collect()
    }

    pub async fn latest(&self, limit: Option<usize>) -> Sourced<Vec<NewsArticle>> {
        let limit = limit.unwrap_or(DEFAULT_NEWS_LIMIT).clamp(1, MAX_NEWS_LIMIT);
        let key = format!("news:{}", limit);

        match self
            .cache
            .get_or_fetch(&key, || self.aggregate(limit))
            .await
        {
            Ok(articles) => articles,
            Err(e) => {
                log::warn!("News lookup failed: {}", e);
                Sourced::fallback(fallback_articles())
            }
        }
    }

    async fn aggregate(&self, limit: usize) -> FetchResult<Sourced<Vec<NewsArticle>>> {
        let per_feed = limit.div_ceil(2);
        let mut articles = Vec::new();

        for feed in &self.feeds {
            if !self.limiter.allow(&feed.rate_key()) {
                continue;
            }
            match feed.fetch(per_feed).await {
                Ok(items) => articles.extend(items),
                Err(e) => log::warn!("Feed {} failed: {}", feed.host(), e),
            }
        }

        articles.truncate(limit);

        if articles.is_empty() {
            return Err(FetchError::Exhausted(
                "no articles from any feed".to_string(),
            ));
        }

        Ok(Sourced::live(articles, SOURCE_NAME))
    }
}
