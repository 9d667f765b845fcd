use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::error::AppResult;
use crate::registration::{validate_contact, ContactForm};

#[derive(Serialize)]
struct ContactResponse {
    success: bool,
    message: &'static str,
}

/// POST /api/contact - Validate and accept a contact message
pub async fn submit(body: web::Json<ContactForm>) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    validate_contact(&form)?;

    log::info!("Contact message received from {}", form.email.trim());

    Ok(HttpResponse::Ok().json(ContactResponse {
        success: true,
        message: "Thank you for your message! We'll get back to you soon.",
    }))
}

/// Configure contact routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/contact", web::post().to(submit));
}
