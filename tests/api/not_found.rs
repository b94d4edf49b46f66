use reqwest::{
    header::{ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN},
    Method,
};

use crate::helpers::TestServer;

#[tokio::test]
async fn unknown_routes_return_404() {
    let server = TestServer::spawn().await;
    for route in ["/foo", "/test/extra", "/healthz/", "/index.html"] {
        let response = server.send(server.request(Method::GET, route)).await;
        assert_eq!(404, response.status().as_u16(), "{route} was routed");
    }
}

#[tokio::test]
async fn not_found_responses_carry_cors_headers() {
    let server = TestServer::spawn().await;
    let request = server
        .request(Method::POST, "/foo")
        .header(ORIGIN, "https://app.example.com");
    let response = server.send(request).await;
    assert_eq!(404, response.status().as_u16());
    assert_eq!(
        "https://app.example.com",
        response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN]
    );
    assert_eq!(
        "GET, POST, OPTIONS",
        response.headers()[ACCESS_CONTROL_ALLOW_METHODS]
    );
}
