use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{cookie::Key, middleware, web, App, HttpServer};
use std::io;

use fellowship::config::{Config, SecurityConfig};
use fellowship::routes;
use fellowship::state::AppState;
use fellowship::store;

fn startup_error(stage: &str, err: impl std::fmt::Display) -> io::Error {
    log::error!("{} failed: {}", stage, err);
    io::Error::other(format!("{}: {}", stage, err))
}

/// Cookie signing key; a random one means sessions end with the process
fn session_key(security: &SecurityConfig) -> Key {
    if let Some(secret) = &security.session_secret_key {
        // Length was checked by SecurityConfig::from_env
        return Key::from(secret.as_bytes());
    }

    log::warn!("SESSION_SECRET_KEY not set, sessions will not survive a restart");
    use rand::Rng;
    let bytes: [u8; 32] = rand::rng().random();
    Key::from(hex::encode(bytes).as_bytes())
}

/// The site front end is served from another origin and sends cookies
fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(["GET", "POST", "OPTIONS"])
        .allowed_headers([header::ACCEPT, header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Chosen once; handlers never re-check the database
    let store = store::connect(&config)
        .await
        .map_err(|e| startup_error("Store initialisation", e))?;

    let state = AppState::new(&config, store)
        .map(web::Data::new)
        .map_err(|e| startup_error("HTTP client setup", e))?;

    log::info!(
        "Fellowship server listening on {}:{} (store: {}, crawler: {})",
        config.host,
        config.port,
        state.store.backend(),
        if state.crawler.is_some() { "on" } else { "off" }
    );

    let key = session_key(&config.security);
    let secure_cookies = config.security.ssl_proxy;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            // CORS has to see the request before the session layer
            .wrap(cors())
            .wrap(fellowship::session_middleware(key.clone(), secure_cookies))
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .shutdown_timeout(30)
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        wait_for_shutdown().await;
        log::info!("Shutting down, draining open requests");
        handle.stop(true).await;
    });

    server.await
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
                return;
            }
            Err(e) => log::error!("Cannot listen for SIGTERM: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
