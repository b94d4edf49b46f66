mod keys;

use std::time::Duration;

use jsonwebtoken::{decode, decode_header, get_current_timestamp, Algorithm, Validation};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::configuration::IdentityConfig;
use keys::KeyStore;

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const MAX_SUBJECT_LEN: usize = 128;
const CLOCK_SKEW_SECS: u64 = 60;
/// Lifetime of a key set fetched without a usable `max-age`.
const MIN_KEYS_TTL: Duration = Duration::from_secs(60);

/// Failure to construct the verifier. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("No identity project configured, set GOOGLE_CLOUD_PROJECT")]
    MissingProjectId,
    #[error("Invalid identity provider key URL {url:?}: {reason}")]
    InvalidKeysUrl { url: String, reason: String },
    #[error("Failed to build the identity provider HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

/// Why a presented token was not accepted.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Token is not a well-formed JWT")]
    Malformed(#[source] jsonwebtoken::errors::Error),
    #[error("Token header names no signing key")]
    MissingKeyId,
    #[error("Token was signed with unknown key {0:?}")]
    UnknownKey(String),
    #[error("Failed to fetch the identity provider's signing keys")]
    KeyFetch(#[source] reqwest::Error),
    #[error("Token failed validation")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("Token subject is empty or too long")]
    InvalidSubject,
    #[error("Token was issued in the future")]
    IssuedInFuture,
    #[error("Identity provider did not answer within {0:?}")]
    Timeout(Duration),
}

/// Verified claims of an ID token.
#[derive(Clone, Debug, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// The `email` claim, or `""` when the token carries none.
    pub fn email(&self) -> &str {
        self.extra.get("email").and_then(Value::as_str).unwrap_or_default()
    }
}

/// Verifies ID tokens issued by Firebase Authentication for one project.
pub struct IdentityVerifier {
    keys: KeyStore,
    validation: Validation,
    timeout: Duration,
}

impl IdentityVerifier {
    pub fn new(config: IdentityConfig) -> Result<Self, IdentityError> {
        let project_id = config.project_id.ok_or(IdentityError::MissingProjectId)?;
        let url = Url::parse(&config.keys_url).map_err(|e| IdentityError::InvalidKeysUrl {
            url: config.keys_url.clone(),
            reason: e.to_string(),
        })?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(IdentityError::HttpClient)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&project_id]);
        validation.set_issuer(&[format!("{ISSUER_PREFIX}{project_id}")]);
        validation.set_required_spec_claims(&["exp", "iat", "aud", "iss", "sub"]);
        validation.leeway = CLOCK_SKEW_SECS;

        tracing::info!(project_id = %project_id, "Identity verifier ready");
        Ok(Self {
            keys: KeyStore::new(http_client, url, MIN_KEYS_TTL),
            validation,
            timeout: config.timeout,
        })
    }

    /// Verifies `token`, bounded by the configured timeout.
    #[tracing::instrument(name = "Verifying ID token", skip_all)]
    pub async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        tokio::time::timeout(self.timeout, self.verify_unbounded(token))
            .await
            .map_err(|_| VerifyError::Timeout(self.timeout))?
    }

    async fn verify_unbounded(&self, token: &str) -> Result<Claims, VerifyError> {
        let header = decode_header(token).map_err(VerifyError::Malformed)?;
        let kid = header.kid.ok_or(VerifyError::MissingKeyId)?;
        let key = self.keys.get(&kid).await?;
        let claims = decode::<Claims>(token, &key, &self.validation)
            .map_err(VerifyError::Invalid)?
            .claims;
        if claims.sub.is_empty() || claims.sub.len() > MAX_SUBJECT_LEN {
            return Err(VerifyError::InvalidSubject);
        }
        if claims.iat > get_current_timestamp() + CLOCK_SKEW_SECS {
            return Err(VerifyError::IssuedInFuture);
        }
        Ok(claims)
    }
}
