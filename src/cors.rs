use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::header::{
        HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
    },
};
use actix_web_lab::middleware::Next;

const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Adds the CORS headers to every response. Handler and auth failures
/// arrive here as ordinary 4xx responses and get them too.
pub async fn cors(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> actix_web::Result<ServiceResponse<BoxBody>> {
    let origin = allowed_origin(req.headers());
    let mut response = next.call(req).await?.map_into_boxed_body();
    set_cors_headers(response.headers_mut(), origin);
    Ok(response)
}

/// The request's `Origin` echoed back verbatim, `*` when there is none.
fn allowed_origin(request_headers: &HeaderMap) -> HeaderValue {
    request_headers
        .get(ORIGIN)
        .filter(|origin| !origin.is_empty())
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"))
}

fn set_cors_headers(response_headers: &mut HeaderMap, origin: HeaderValue) {
    response_headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    response_headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    response_headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
}
