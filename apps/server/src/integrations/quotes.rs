use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::send_json;
use crate::resilience::{
    FallbackChain, FetchCache, FetchError, FetchResult, RateLimiter, Source, Sourced,
};

const QUOTE_TAGS: &str = "faith|christianity|god";
const QUOTE_MAX_LENGTH: &str = "150";
const CACHE_KEY: &str = "quote:daily";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub quote: String,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
struct QuotableQuote {
    content: String,
    author: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// Quotable answers with one object, or a one-element array on some mirrors
#[derive(Deserialize)]
#[serde(untagged)]
enum QuotableBody {
    One(QuotableQuote),
    Many(Vec<QuotableQuote>),
}

pub fn fallback_quotes() -> Vec<Quote> {
    vec![
        Quote {
            quote: "Faith is taking the first step even when you don't see the whole staircase."
                .to_string(),
            author: "Martin Luther King Jr.".to_string(),
            tags: vec!["faith".into(), "trust".into(), "courage".into()],
        },
        Quote {
            quote: "God never said that the journey would be easy, but He did say that the arrival would be worthwhile."
                .to_string(),
            author: "Max Lucado".to_string(),
            tags: vec!["journey".into(), "perseverance".into(), "hope".into()],
        },
        Quote {
            quote: "Prayer does not change God, but it changes him who prays.".to_string(),
            author: "Søren Kierkegaard".to_string(),
            tags: vec!["prayer".into(), "transformation".into(), "growth".into()],
        },
    ]
}

/// Picks one of the bundled quotes at random
pub fn random_fallback_quote() -> Quote {
    let quotes = fallback_quotes();
    let mut rng = rand::rng();
    quotes
        .choose(&mut rng)
        .cloned()
        .unwrap_or_else(|| quotes[0].clone())
}

pub struct QuotableSource {
    http: reqwest::Client,
    base_url: String,
}

impl QuotableSource {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Source<(), Quote> for QuotableSource {
    fn name(&self) -> &'static str {
        "quotable"
    }

    async fn fetch(&self, _query: &()) -> FetchResult<Quote> {
        let request = self
            .http
            .get(format!("{}/quotes/random", self.base_url))
            .query(&[("tags", QUOTE_TAGS), ("maxLength", QUOTE_MAX_LENGTH)]);

        let quote = match send_json::<QuotableBody>(self.name(), request).await? {
            QuotableBody::One(quote) => quote,
            QuotableBody::Many(quotes) => quotes
                .into_iter()
                .next()
                .ok_or_else(|| FetchError::parse(self.name(), "empty quote list"))?,
        };

        Ok(Quote {
            quote: quote.content,
            author: quote.author,
            tags: quote.tags,
        })
    }
}

pub struct QuotesService {
    chain: FallbackChain<(), Quote>,
    cache: FetchCache<Quote>,
}

impl QuotesService {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        limiter: Arc<RateLimiter>,
        ttl: Duration,
    ) -> Self {
        let chain = FallbackChain::<(), Quote>::new(limiter)
            .with_source(Arc::new(QuotableSource::new(http, base_url)));
        Self::from_chain(chain, ttl)
    }

    pub fn from_chain(chain: FallbackChain<(), Quote>, ttl: Duration) -> Self {
        Self {
            chain,
            cache: FetchCache::new(ttl),
        }
    }

    /// Quote of the day; a bundled quote when Quotable is unreachable
    pub async fn daily_quote(&self) -> Sourced<Quote> {
        match self
            .cache
            .get_or_fetch(CACHE_KEY, || self.chain.resolve(&()))
            .await
        {
            Ok(quote) => quote,
            Err(e) => {
                log::warn!("Quote lookup failed: {}", e);
                Sourced::fallback(random_fallback_quote())
            }
        }
    }
}
