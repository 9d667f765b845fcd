use std::sync::Arc;

use crate::config::Config;
use crate::integrations::{
    build_http_client, BibleService, CalendarService, FellowshipCrawler, FirecrawlClient,
    NewsService, QuotesService,
};
use crate::resilience::RateLimiter;
use crate::store::FellowshipStore;

/// Everything request handlers share, built once in `main`
pub struct AppState {
    pub store: Arc<dyn FellowshipStore>,
    pub bible: BibleService,
    pub quotes: QuotesService,
    pub news: NewsService,
    pub calendar: CalendarService,
    /// `None` when no Firecrawl key is configured
    pub crawler: Option<FellowshipCrawler>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn FellowshipStore>) -> reqwest::Result<Self> {
        let http = build_http_client(config.cache.http_timeout)?;
        let limiter = Arc::new(RateLimiter::new(config.cache.min_request_interval));
        let ttl = config.cache.ttl;
        let integrations = &config.integrations;

        let crawler = FirecrawlClient::new(
            http.clone(),
            &integrations.firecrawl_api_url,
            integrations.firecrawl_api_key.clone(),
            limiter.clone(),
        )
        .map(FellowshipCrawler::new);

        Ok(Self {
            store,
            bible: BibleService::new(integrations, http.clone(), limiter.clone(), ttl),
            quotes: QuotesService::new(
                http.clone(),
                &integrations.quotes_api_url,
                limiter.clone(),
                ttl,
            ),
            news: NewsService::new(
                http,
                &integrations.rss_proxy_url,
                &integrations.news_feeds,
                limiter.clone(),
                ttl,
            ),
            calendar: CalendarService::new(ttl),
            crawler,
            limiter,
        })
    }
}
