use std::time::Duration;

use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use once_cell::sync::Lazy;
use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder, Response};
use secrecy::Secret;
use serde_json::{json, Value};
use sunrise::{
    configuration::{ApplicationConfig, DatabaseConfig, IdentityConfig},
    database, telemetry, Config, Server,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const PROJECT_ID: &str = "sunrise-test";
const KEY_ID: &str = "test-key";

const SIGNING_KEY: &str = include_str!("fixtures/signing_key.pem");
const ROGUE_KEY: &str = include_str!("fixtures/rogue_key.pem");
const JWKS: &str = include_str!("fixtures/jwks.json");
const FAILED_TO_EXECUTE: &str = "Failed to execute request";

static TELEMETRY: Lazy<Result<(), String>> = Lazy::new(|| {
    let (name, filter) = ("test", "debug");
    let result = if std::env::var("TEST_LOG")
        .unwrap_or_default()
        .parse::<bool>()
        .unwrap_or_default()
    {
        telemetry::init(name, filter, std::io::stdout)
    } else {
        telemetry::init(name, filter, std::io::sink)
    };
    result.map_err(|e| e.to_string())
});

pub struct TestServer {
    pub addr: String,
    pub identity_provider: MockServer,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Lazy::force(&TELEMETRY)
            .as_ref()
            .expect("Failed to initialize telemetry");

        let identity_provider = MockServer::start().await;
        let config = test_config(&identity_provider);
        let db_pool = database::connect_lazy(&config.database);
        let server = Server::with_pool(config, db_pool).expect("Failed to build server");
        let addr = format!("http://127.0.0.1:{}", server.port());
        let _ = tokio::spawn(server.run());
        Self {
            addr,
            identity_provider,
        }
    }

    /// Serves the signing keys, expecting exactly `fetches` downloads.
    pub async fn publish_signing_keys(&self, fetches: u64) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Cache-Control", "public, max-age=3600")
                    .set_body_raw(JWKS, "application/json"),
            )
            .expect(fetches)
            .mount(&self.identity_provider)
            .await;
    }

    /// Serves the signing keys only after `delay`.
    pub async fn stall_signing_keys(&self, delay: Duration) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(JWKS, "application/json")
                    .set_delay(delay),
            )
            .mount(&self.identity_provider)
            .await;
    }

    pub async fn break_signing_keys(&self) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&self.identity_provider)
            .await;
    }

    pub fn request(&self, method: Method, route: &str) -> RequestBuilder {
        Client::new().request(method, format!("{}{}", self.addr, route))
    }

    pub async fn send(&self, request: RequestBuilder) -> Response {
        request.send().await.expect(FAILED_TO_EXECUTE)
    }
}

pub fn test_config(identity_provider: &MockServer) -> Config {
    Config {
        application: ApplicationConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseConfig {
            user: "sunrise".into(),
            password: Secret::new("sunrise".into()),
            name: "sunrise".into(),
            socket: "/nonexistent/sunrise/mysqld.sock".into(),
            timeout: Duration::from_secs(2),
        },
        identity: IdentityConfig {
            project_id: Some(PROJECT_ID.into()),
            keys_url: format!("{}/jwks", identity_provider.uri()),
            timeout: Duration::from_secs(2),
        },
    }
}

pub fn bearer(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header(AUTHORIZATION, format!("Bearer {token}"))
}

/// Claims of a currently valid ID token for the test project.
pub fn valid_claims(email: Option<&str>) -> Value {
    let now = get_current_timestamp();
    let mut claims = json!({
        "iss": format!("https://securetoken.google.com/{PROJECT_ID}"),
        "aud": PROJECT_ID,
        "sub": "uid-1234",
        "auth_time": now - 10,
        "iat": now - 10,
        "exp": now + 3600,
    });
    if let Some(email) = email {
        claims["email"] = json!(email);
    }
    claims
}

pub fn sign(claims: &Value) -> String {
    sign_with(claims, SIGNING_KEY, KEY_ID)
}

pub fn sign_with_rogue_key(claims: &Value) -> String {
    sign_with(claims, ROGUE_KEY, KEY_ID)
}

pub fn sign_with_unknown_key_id(claims: &Value) -> String {
    sign_with(claims, SIGNING_KEY, "retired-key")
}

fn sign_with(claims: &Value, pem: &str, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.into());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("Invalid fixture key");
    encode(&header, claims, &key).expect("Failed to sign token")
}
