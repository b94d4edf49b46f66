use actix_web::{http::header::ContentType, HttpResponse};

/// Liveness probe answering any method without authentication.
pub async fn test_probe() -> HttpResponse {
    ok_text("OK TEST\n")
}

pub async fn healthz() -> HttpResponse {
    ok_text("OK\n")
}

fn ok_text(body: &'static str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(body)
}
