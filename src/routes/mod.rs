mod greeting;
mod health_check;
mod preflight;

pub use greeting::*;
pub use health_check::*;
pub use preflight::*;

use actix_web::{http::header::ContentType, HttpResponse};

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type(ContentType::plaintext())
        .body("404 page not found\n")
}
