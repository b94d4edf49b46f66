use reqwest::{
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
    },
    Method,
};

use crate::helpers::TestServer;

#[tokio::test]
async fn preflight_is_answered_without_verification() {
    let server = TestServer::spawn().await;
    server.publish_signing_keys(0).await;

    let request = server
        .request(Method::OPTIONS, "/")
        .header(ORIGIN, "https://app.example.com")
        .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(ACCESS_CONTROL_REQUEST_HEADERS, "authorization, content-type");
    let response = server.send(request).await;

    assert_eq!(200, response.status().as_u16());
    let headers = response.headers().clone();
    assert_eq!("https://app.example.com", headers[ACCESS_CONTROL_ALLOW_ORIGIN]);
    assert_eq!("Content-Type, Authorization", headers[ACCESS_CONTROL_ALLOW_HEADERS]);
    assert_eq!("GET, POST, OPTIONS", headers[ACCESS_CONTROL_ALLOW_METHODS]);
    assert_eq!("", response.text().await.unwrap());
}

#[tokio::test]
async fn preflight_without_origin_allows_any_origin() {
    let server = TestServer::spawn().await;
    let response = server.send(server.request(Method::OPTIONS, "/")).await;
    assert_eq!(200, response.status().as_u16());
    assert_eq!("*", response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN]);
}
