//! Fellowship Server Library
//!
//! Content aggregation (Bible, quotes, news, calendar, study resources) and
//! community records for a Christian fellowship site. Exposed as a library
//! so tests can build the app in-process.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod integrations;
pub mod models;
pub mod registration;
pub mod resilience;
pub mod routes;
pub mod state;
pub mod store;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};

pub const SESSION_COOKIE_NAME: &str = "fellowship_session";

/// Cookie session middleware shared by the binary and the tests
pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE_NAME.to_string())
        .cookie_secure(secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build()
}
