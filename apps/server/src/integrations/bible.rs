//! Bible verse lookup and search.
//!
//! Verses resolve through Scripture API, then Bible.org, then OpenBible,
//! then a bundled table of the daily verses.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use super::send_json;
use crate::config::IntegrationsConfig;
use crate::resilience::{
    FallbackChain, FetchCache, FetchError, FetchResult, RateLimiter, Source, Sourced,
};

/// Translation abbreviation to Scripture API Bible id
pub const BIBLE_VERSIONS: &[(&str, &str)] = &[
    ("ESV", "de4e12af7f28f599-02"),
    ("NIV", "78a9f6124f344018-01"),
    ("KJV", "de4e12af7f28f599-01"),
    ("NKJV", "de4e12af7f28f599-03"),
    ("NLT", "65eec8e0b60e656b-01"),
    ("NASB", "de4e12af7f28f599-04"),
    ("CSB", "de4e12af7f28f599-05"),
    ("RSV", "de4e12af7f28f599-06"),
    ("ASV", "de4e12af7f28f599-07"),
    ("WEB", "de4e12af7f28f599-08"),
];

pub const DEFAULT_BIBLE_ID: &str = "de4e12af7f28f599-02";

pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const MAX_SEARCH_LIMIT: usize = 50;

/// Rotation used for the verse of the day
pub const DAILY_VERSES: [&str; 10] = [
    "John 3:16",
    "Philippians 4:13",
    "Jeremiah 29:11",
    "Romans 8:28",
    "Psalm 23:1",
    "Matthew 11:28",
    "Isaiah 40:31",
    "2 Timothy 1:7",
    "Joshua 1:9",
    "1 Peter 5:7",
];

pub const FALLBACK_TRANSLATION: &str = "Fallback";

pub const JOHN_3_16: &str = "For God so loved the world, that he gave his only Son, that whoever believes in him should not perish but have eternal life.";

const FALLBACK_VERSES: &[(&str, &str)] = &[
    ("John 3:16", JOHN_3_16),
    (
        "Philippians 4:13",
        "I can do all things through him who strengthens me.",
    ),
    (
        "Jeremiah 29:11",
        "For I know the plans I have for you, declares the Lord, plans for welfare and not for evil, to give you a future and a hope.",
    ),
    (
        "Romans 8:28",
        "And we know that for those who love God all things work together for good, for those who are called according to his purpose.",
    ),
    ("Psalm 23:1", "The Lord is my shepherd; I shall not want."),
    (
        "Matthew 11:28",
        "Come to me, all who labor and are heavy laden, and I will give you rest.",
    ),
    (
        "Isaiah 40:31",
        "But they who wait for the Lord shall renew their strength; they shall mount up with wings like eagles; they shall run and not be weary; they shall walk and not faint.",
    ),
    (
        "2 Timothy 1:7",
        "For God gave us a spirit not of fear but of power and love and self-control.",
    ),
    (
        "Joshua 1:9",
        "Have I not commanded you? Be strong and courageous. Do not be frightened, and do not be dismayed, for the Lord your God is with you wherever you go.",
    ),
    (
        "1 Peter 5:7",
        "Casting all your anxieties on him, because he cares for you.",
    ),
];

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex is valid"));

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    pub content: String,
    pub reference: String,
    pub translation: String,
}

/// A Bible search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub reference: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslationInfo {
    pub abbreviation: &'static str,
    pub bible_id: &'static str,
}

#[derive(Debug, Clone)]
pub struct VerseQuery {
    pub reference: String,
    pub translation: String,
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub translation: String,
    pub limit: usize,
}

// =============================================================================
// Helpers
// =============================================================================

/// Scripture API Bible id for a translation abbreviation (ESV when unknown)
pub fn bible_id(translation: &str) -> &'static str {
    BIBLE_VERSIONS
        .iter()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(translation))
        .map(|(_, id)| *id)
        .unwrap_or(DEFAULT_BIBLE_ID)
}

/// Removes markup returned by the Scripture API and collapses whitespace
pub fn strip_html(content: &str) -> String {
    HTML_TAG
        .replace_all(content, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Bundled text for `reference`; unknown references get John 3:16
pub fn fallback_verse(reference: &str) -> Verse {
    let content = FALLBACK_VERSES
        .iter()
        .find(|(r, _)| *r == reference)
        .map(|(_, text)| *text)
        .unwrap_or(JOHN_3_16);

    Verse {
        content: content.to_string(),
        reference: reference.to_string(),
        translation: FALLBACK_TRANSLATION.to_string(),
    }
}

/// Reference of the verse of the day, stable for a given calendar day
pub fn daily_reference(date: NaiveDate) -> &'static str {
    DAILY_VERSES[date.ordinal() as usize % DAILY_VERSES.len()]
}

// =============================================================================
// Scripture API
// =============================================================================

#[derive(Deserialize)]
struct ScriptureSearchResponse {
    data: ScriptureSearchData,
}

#[derive(Deserialize)]
struct ScriptureSearchData {
    #[serde(default)]
    passages: Vec<ScripturePassage>,
}

#[derive(Deserialize)]
struct ScripturePassage {
    #[serde(default)]
    reference: Option<String>,
    content: String,
}

/// api.scripture.api.bible, keyed by an `api-key` header
pub struct ScriptureApiSource {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ScriptureApiSource {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn search_passages(
        &self,
        translation: &str,
        query: &str,
        limit: Option<usize>,
    ) -> FetchResult<Vec<ScripturePassage>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| FetchError::NotConfigured(SCRIPTURE_API.to_string()))?;

        let url = format!("{}/bibles/{}/search", self.base_url, bible_id(translation));
        let mut request = self
            .http
            .get(url)
            .header("api-key", api_key)
            .query(&[("query", query)]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }

        let response: ScriptureSearchResponse = send_json(SCRIPTURE_API, request).await?;
        Ok(response.data.passages)
    }
}

const SCRIPTURE_API: &str = "scripture_api";

#[async_trait]
impl Source<VerseQuery, Verse> for ScriptureApiSource {
    fn name(&self) -> &'static str {
        SCRIPTURE_API
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, query: &VerseQuery) -> FetchResult<Verse> {
        let passage = self
            .search_passages(&query.translation, &query.reference, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::parse(SCRIPTURE_API, "no passages returned"))?;

        Ok(Verse {
            content: strip_html(&passage.content),
            reference: query.reference.clone(),
            translation: query.translation.clone(),
        })
    }
}

#[async_trait]
impl Source<SearchQuery, Vec<Passage>> for ScriptureApiSource {
    fn name(&self) -> &'static str {
        SCRIPTURE_API
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, query: &SearchQuery) -> FetchResult<Vec<Passage>> {
        let passages = self
            .search_passages(&query.translation, &query.query, Some(query.limit))
            .await?;

        Ok(passages
            .into_iter()
            .take(query.limit)
            .map(|p| Passage {
                reference: p.reference.unwrap_or_default(),
                content: strip_html(&p.content),
            })
            .collect())
    }
}

// =============================================================================
// Bible.org
// =============================================================================

#[derive(Deserialize)]
struct BibleOrgResponse {
    response: BibleOrgPassages,
}

#[derive(Deserialize)]
struct BibleOrgPassages {
    #[serde(default)]
    passages: Vec<TextPassage>,
}

#[derive(Deserialize)]
struct TextPassage {
    text: String,
}

pub struct BibleOrgSource {
    http: reqwest::Client,
    base_url: String,
}

impl BibleOrgSource {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Source<VerseQuery, Verse> for BibleOrgSource {
    fn name(&self) -> &'static str {
        "bible_org"
    }

    async fn fetch(&self, query: &VerseQuery) -> FetchResult<Verse> {
        let request = self
            .http
            .get(format!("{}/passages.js", self.base_url))
            .query(&[("formatting", "plain"), ("q", query.reference.as_str())]);

        let response: BibleOrgResponse = send_json(self.name(), request).await?;
        let passage = response
            .response
            .passages
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::parse(self.name(), "no passages returned"))?;

        Ok(Verse {
            content: strip_html(&passage.text),
            reference: query.reference.clone(),
            translation: query.translation.clone(),
        })
    }
}

// =============================================================================
// OpenBible (labs.bible.org)
// =============================================================================

/// labs.bible.org only serves the KJV-era NET text and labels it KJV
pub struct OpenBibleSource {
    http: reqwest::Client,
    base_url: String,
}

impl OpenBibleSource {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Source<VerseQuery, Verse> for OpenBibleSource {
    fn name(&self) -> &'static str {
        "open_bible"
    }

    async fn fetch(&self, query: &VerseQuery) -> FetchResult<Verse> {
        let request = self.http.get(format!("{}/", self.base_url)).query(&[
            ("passage", query.reference.as_str()),
            ("formatting", "plain"),
            ("type", "json"),
        ]);

        let verses: Vec<TextPassage> = send_json(self.name(), request).await?;
        if verses.is_empty() {
            return Err(FetchError::parse(self.name(), "empty verse list"));
        }

        let content = verses
            .iter()
            .map(|v| strip_html(&v.text))
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Verse {
            content,
            reference: query.reference.clone(),
            translation: "KJV".to_string(),
        })
    }
}

// =============================================================================
// Service
// =============================================================================

pub struct BibleService {
    verse_chain: FallbackChain<VerseQuery, Verse>,
    search_chain: FallbackChain<SearchQuery, Vec<Passage>>,
    verse_cache: FetchCache<Verse>,
    search_cache: FetchCache<Vec<Passage>>,
    default_translation: String,
}

impl BibleService {
    /// Wires the production source order from configuration
    pub fn new(
        config: &IntegrationsConfig,
        http: reqwest::Client,
        limiter: Arc<RateLimiter>,
        ttl: Duration,
    ) -> Self {
        let scripture = Arc::new(ScriptureApiSource::new(
            http.clone(),
            &config.scripture_api_url,
            config.scripture_api_key.clone(),
        ));

        let verse_chain = FallbackChain::<VerseQuery, Verse>::new(limiter.clone())
            .with_source(scripture.clone())
            .with_source(Arc::new(BibleOrgSource::new(
                http.clone(),
                &config.bible_org_url,
            )))
            .with_source(Arc::new(OpenBibleSource::new(http, &config.open_bible_url)));

        let search_chain =
            FallbackChain::<SearchQuery, Vec<Passage>>::new(limiter).with_source(scripture);

        Self::from_chains(verse_chain, search_chain, ttl, &config.default_translation)
    }

    pub fn from_chains(
        verse_chain: FallbackChain<VerseQuery, Verse>,
        search_chain: FallbackChain<SearchQuery, Vec<Passage>>,
        ttl: Duration,
        default_translation: &str,
    ) -> Self {
        Self {
            verse_chain,
            search_chain,
            verse_cache: FetchCache::new(ttl),
            search_cache: FetchCache::new(ttl),
            default_translation: default_translation.to_uppercase(),
        }
    }

    /// Looks up a verse; never fails, ending with the bundled verse table
    pub async fn verse(&self, reference: &str, translation: Option<&str>) -> Sourced<Verse> {
        let query = VerseQuery {
            reference: reference.trim().to_string(),
            translation: translation
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| self.default_translation.clone()),
        };
        let key = format!("verse:{}:{}", query.translation, query.reference);

        match self
            .verse_cache
            .get_or_fetch(&key, || self.verse_chain.resolve(&query))
            .await
        {
            Ok(verse) => verse,
            Err(e) => {
                log::warn!("All Bible sources failed for {}: {}", query.reference, e);
                Sourced::fallback(fallback_verse(&query.reference))
            }
        }
    }

    /// Verse of the day for `date`
    pub async fn daily_verse(&self, date: NaiveDate) -> Sourced<Verse> {
        self.verse(daily_reference(date), None).await
    }

    /// Full-text search; failures yield an empty list
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Sourced<Vec<Passage>> {
        let query = SearchQuery {
            query: query.trim().to_string(),
            translation: self.default_translation.clone(),
            limit: limit
                .unwrap_or(DEFAULT_SEARCH_LIMIT)
                .clamp(1, MAX_SEARCH_LIMIT),
        };
        let key = format!("search:{}:{}:{}", query.translation, query.limit, query.query);

        match self
            .search_cache
            .get_or_fetch(&key, || self.search_chain.resolve(&query))
            .await
        {
            Ok(passages) => passages,
            Err(e) => {
                log::warn!("Bible search failed for '{}': {}", query.query, e);
                Sourced::fallback(Vec::new())
            }
        }
    }

    pub fn versions() -> Vec<TranslationInfo> {
        BIBLE_VERSIONS
            .iter()
            .map(|&(abbreviation, bible_id)| TranslationInfo {
                abbreviation,
                bible_id,
            })
            .collect()
    }

    pub fn default_translation(&self) -> &str {
        &self.default_translation
    }
}
