use actix_web::{
    http::header::{
        HeaderMap, HeaderName, ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD,
        ORIGIN,
    },
    HttpRequest, HttpResponse,
};

#[tracing::instrument(
    name = "Answering a CORS preflight",
    skip(request),
    fields(
        origin = header(request.headers(), ORIGIN),
        requested_method = header(request.headers(), ACCESS_CONTROL_REQUEST_METHOD),
        requested_headers = header(request.headers(), ACCESS_CONTROL_REQUEST_HEADERS),
    )
)]
pub async fn preflight(request: HttpRequest) -> HttpResponse {
    tracing::info!("Preflight accepted");
    HttpResponse::Ok().finish()
}

fn header(headers: &HeaderMap, name: HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
