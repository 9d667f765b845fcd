use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::integrations::FellowshipCrawler;
use crate::resilience::FetchError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub content: String,
}

#[derive(Serialize)]
struct Unavailable {
    available: bool,
    message: &'static str,
}

#[derive(Serialize)]
struct Available<T> {
    available: bool,
    data: T,
}

fn unavailable() -> HttpResponse {
    HttpResponse::Ok().json(Unavailable {
        available: false,
        message: "Resource crawling is not configured",
    })
}

fn available<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Available {
        available: true,
        data,
    })
}

fn upstream_error(err: FetchError) -> AppError {
    log::warn!("Firecrawl request failed: {}", err);
    AppError::Upstream(err.to_string())
}

fn crawler(state: &AppState) -> Option<&FellowshipCrawler> {
    state.crawler.as_ref()
}

fn validate_url(url: &str) -> AppResult<()> {
    url::Url::parse(url)
        .map(|_| ())
        .map_err(|_| AppError::invalid(format!("Invalid URL: {}", url)))
}

/// POST /api/resources/scrape - Scrape a list of pages
pub async fn scrape(
    state: web::Data<AppState>,
    body: web::Json<ScrapeRequest>,
) -> AppResult<HttpResponse> {
    let Some(crawler) = crawler(&state) else {
        return Ok(unavailable());
    };

    let urls = body.into_inner().urls;
    if urls.is_empty() {
        return Err(AppError::invalid("At least one URL is required"));
    }
    for url in &urls {
        validate_url(url)?;
    }

    Ok(available(crawler.scrape_resources(&urls).await))
}

/// POST /api/resources/crawl - Crawl a site for study material
pub async fn crawl(
    state: web::Data<AppState>,
    body: web::Json<CrawlRequest>,
) -> AppResult<HttpResponse> {
    let Some(crawler) = crawler(&state) else {
        return Ok(unavailable());
    };

    validate_url(&body.url)?;
    let pages = crawler
        .crawl_study_materials(&body.url)
        .await
        .map_err(upstream_error)?;

    Ok(available(pages))
}

/// POST /api/resources/search - Search study topics
pub async fn search(
    state: web::Data<AppState>,
    body: web::Json<SearchRequest>,
) -> AppResult<HttpResponse> {
    let Some(crawler) = crawler(&state) else {
        return Ok(unavailable());
    };

    if body.query.trim().is_empty() {
        return Err(AppError::invalid("query is required"));
    }
    let hits = crawler
        .search_study_topics(body.query.trim(), body.content.as_deref())
        .await
        .map_err(upstream_error)?;

    Ok(available(hits))
}

/// POST /api/resources/extract - Pull Bible study details from text
pub async fn extract(
    state: web::Data<AppState>,
    body: web::Json<ExtractRequest>,
) -> AppResult<HttpResponse> {
    let Some(crawler) = crawler(&state) else {
        return Ok(unavailable());
    };

    if body.content.trim().is_empty() {
        return Err(AppError::invalid("content is required"));
    }
    let info = crawler
        .extract_bible_study_info(&body.content)
        .await
        .map_err(upstream_error)?;

    Ok(available(info))
}

/// Configure resource routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/resources")
            .route("/scrape", web::post().to(scrape))
            .route("/crawl", web::post().to(crawl))
            .route("/search", web::post().to(search))
            .route("/extract", web::post().to(extract)),
    );
}
