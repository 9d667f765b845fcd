pub mod auth;
pub mod contact;
pub mod content;
pub mod fellowship;
pub mod health;
pub mod register;
pub mod resources;

use actix_web::web;

/// Registers every route of the server
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure)
        .configure(auth::configure)
        .configure(content::configure)
        .configure(resources::configure)
        .configure(register::configure)
        .configure(fellowship::configure)
        .configure(contact::configure);
}
