use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Remote database settings. `None` selects the local store.
    pub database: Option<DatabaseConfig>,
    pub local_store_dir: PathBuf,
    pub cache: CacheConfig,
    pub integrations: IntegrationsConfig,
    pub security: SecurityConfig,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Security configuration for production deployments
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// True if server is behind a proxy that terminates SSL (nginx, Cloudflare, etc.)
    /// When true: cookie_secure=true is enabled
    pub ssl_proxy: bool,
    /// Session encryption key (64 hex chars). Required when ssl_proxy=true
    pub session_secret_key: Option<String>,
}

/// Caching and rate limiting shared by every content integration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a fetched value is served without calling the network
    pub ttl: Duration,
    /// Minimum spacing between two calls to the same upstream API
    pub min_request_interval: Duration,
    /// Timeout applied to every outbound request
    pub http_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            min_request_interval: Duration::from_millis(1000),
            http_timeout: Duration::from_secs(10),
        }
    }
}

/// Upstream API endpoints and credentials.
///
/// Keys that are unset or still hold a setup placeholder are `None`; the
/// matching integration is then treated as unavailable.
#[derive(Debug, Clone)]
pub struct IntegrationsConfig {
    pub scripture_api_url: String,
    pub scripture_api_key: Option<String>,
    pub default_translation: String,
    pub bible_org_url: String,
    pub open_bible_url: String,
    pub quotes_api_url: String,
    pub rss_proxy_url: String,
    pub news_feeds: Vec<String>,
    pub firecrawl_api_url: String,
    pub firecrawl_api_key: Option<String>,
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            scripture_api_url: "https://api.scripture.api.bible/v1".to_string(),
            scripture_api_key: None,
            default_translation: "ESV".to_string(),
            bible_org_url: "https://api.bible.org/v2".to_string(),
            open_bible_url: "https://labs.bible.org/api".to_string(),
            quotes_api_url: "https://api.quotable.io".to_string(),
            rss_proxy_url: "https://api.rss2json.com/v1/api.json".to_string(),
            news_feeds: vec![
                "https://www.christianpost.com/rss.xml".to_string(),
                "https://www.crosswalk.com/rss.xml".to_string(),
            ],
            firecrawl_api_url: "https://api.firecrawl.dev".to_string(),
            firecrawl_api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database: DatabaseConfig::from_env(),
            local_store_dir: PathBuf::from(
                env::var("LOCAL_STORE_DIR").unwrap_or_else(|_| ".fellowship-data".to_string()),
            ),
            cache: CacheConfig::from_env(),
            integrations: IntegrationsConfig::from_env()?,
            security: SecurityConfig::from_env()?,
        })
    }
}

impl DatabaseConfig {
    /// Load database configuration; returns `None` when no URL is configured
    pub fn from_env() -> Option<Self> {
        let url = env::var("DATABASE_URL")
            .ok()
            .and_then(|v| configured_value(&v))?;

        Some(Self {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            acquire_timeout: Duration::from_secs(
                env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            idle_timeout: Duration::from_secs(
                env::var("DATABASE_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                env::var("DATABASE_MAX_LIFETIME_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
        })
    }
}

impl CacheConfig {
    /// Load cache configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            ttl: Duration::from_secs(
                env::var("CACHE_TTL_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
            min_request_interval: Duration::from_millis(
                env::var("RATE_LIMIT_INTERVAL_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .unwrap_or(1000),
            ),
            http_timeout: Duration::from_secs(
                env::var("HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            ),
        }
    }
}

impl IntegrationsConfig {
    /// Load upstream endpoints and keys from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let news_feeds = match env::var("NEWS_FEEDS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
            Err(_) => defaults.news_feeds,
        };

        let config = Self {
            scripture_api_url: url_var("SCRIPTURE_API_URL", defaults.scripture_api_url)?,
            scripture_api_key: api_key_var("SCRIPTURE_API_KEY"),
            default_translation: env::var("DEFAULT_TRANSLATION")
                .unwrap_or(defaults.default_translation)
                .to_uppercase(),
            bible_org_url: url_var("BIBLE_ORG_URL", defaults.bible_org_url)?,
            open_bible_url: url_var("OPEN_BIBLE_URL", defaults.open_bible_url)?,
            quotes_api_url: url_var("QUOTES_API_URL", defaults.quotes_api_url)?,
            rss_proxy_url: url_var("RSS_PROXY_URL", defaults.rss_proxy_url)?,
            news_feeds,
            firecrawl_api_url: url_var("FIRECRAWL_API_URL", defaults.firecrawl_api_url)?,
            firecrawl_api_key: api_key_var("FIRECRAWL_API_KEY"),
        };

        if config.scripture_api_key.is_none() {
            log::warn!("SCRIPTURE_API_KEY not set, Scripture API source disabled");
        }
        if config.firecrawl_api_key.is_none() {
            log::warn!("FIRECRAWL_API_KEY not set, study resource crawling disabled");
        }

        Ok(config)
    }
}

impl SecurityConfig {
    /// Load security configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_secret_key = env::var("SESSION_SECRET_KEY").ok();

        let ssl_proxy = env::var("SSL_PROXY")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        // When SSL_PROXY is enabled, SESSION_SECRET_KEY is required
        if ssl_proxy && session_secret_key.is_none() {
            return Err(ConfigError::MissingSessionSecret);
        }

        // Cookie signing keys are derived from at least 64 bytes
        if let Some(secret) = &session_secret_key {
            if secret.len() < MIN_SESSION_SECRET_LEN {
                return Err(ConfigError::SessionSecretTooShort(secret.len()));
            }
        }

        Ok(Self {
            ssl_proxy,
            session_secret_key,
        })
    }
}

/// Shortest `SESSION_SECRET_KEY` accepted, in bytes
pub const MIN_SESSION_SECRET_LEN: usize = 64;

/// Returns true for values left over from the setup templates
/// (`YOUR_SCRIPTURE_API_KEY`, `your_api_key_here`, ...) or blank values.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return true;
    }
    let upper = value.to_ascii_uppercase();
    upper.starts_with("YOUR_") || upper.ends_with("_HERE") || upper == "CHANGEME"
}

fn configured_value(value: &str) -> Option<String> {
    if is_placeholder(value) {
        None
    } else {
        Some(value.trim().to_string())
    }
}

fn api_key_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|v| configured_value(&v))
}

fn url_var(name: &'static str, default: String) -> Result<String, ConfigError> {
    let value = match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default,
    };

    url::Url::parse(&value).map_err(|_| ConfigError::InvalidUrl(name))?;
    Ok(value.trim_end_matches('/').to_string())
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidUrl(&'static str),
    MissingSessionSecret,
    SessionSecretTooShort(usize),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid number"),
            ConfigError::InvalidUrl(name) => write!(f, "{} must be a valid URL", name),
            ConfigError::MissingSessionSecret => {
                write!(
                    f,
                    "SESSION_SECRET_KEY is required when SSL_PROXY is enabled"
                )
            }
            ConfigError::SessionSecretTooShort(len) => write!(
                f,
                "SESSION_SECRET_KEY must be at least {} bytes long (got {})",
                MIN_SESSION_SECRET_LEN, len
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
