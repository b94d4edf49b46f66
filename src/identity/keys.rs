use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use jsonwebtoken::DecodingKey;
use reqwest::{header::CACHE_CONTROL, header::HeaderMap, Url};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::VerifyError;

#[derive(Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: String,
    e: String,
}

struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    expires_at: Instant,
}

impl CachedKeys {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// The identity provider's signing keys, fetched on first use and kept
/// for as long as the provider allows.
pub(super) struct KeyStore {
    http_client: reqwest::Client,
    url: Url,
    min_ttl: Duration,
    cached: RwLock<Option<CachedKeys>>,
}

impl KeyStore {
    pub fn new(http_client: reqwest::Client, url: Url, min_ttl: Duration) -> Self {
        Self {
            http_client,
            url,
            min_ttl,
            cached: RwLock::new(None),
        }
    }

    pub async fn get(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.is_fresh() {
                return lookup(cached, kid);
            }
        }

        let mut cached = self.cached.write().await;
        // Another task may have refreshed the keys while we waited.
        if let Some(fresh) = cached.as_ref().filter(|c| c.is_fresh()) {
            return lookup(fresh, kid);
        }
        let refreshed = self.fetch().await?;
        let key = lookup(&refreshed, kid);
        *cached = Some(refreshed);
        key
    }

    #[tracing::instrument(name = "Fetching identity provider keys", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<CachedKeys, VerifyError> {
        let response = self
            .http_client
            .get(self.url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(VerifyError::KeyFetch)?;
        let ttl = max_age(response.headers()).map_or(self.min_ttl, |ttl| ttl.max(self.min_ttl));
        let set: JwkSet = response.json().await.map_err(VerifyError::KeyFetch)?;

        let mut keys = HashMap::with_capacity(set.keys.len());
        for jwk in set.keys.into_iter().filter(|k| k.kty == "RSA") {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(e) => tracing::warn!(kid = %jwk.kid, error = %e, "Skipping malformed signing key"),
            }
        }
        tracing::info!(keys = keys.len(), ttl_secs = ttl.as_secs(), "Refreshed signing keys");
        Ok(CachedKeys {
            keys,
            expires_at: Instant::now() + ttl,
        })
    }
}

fn lookup(cached: &CachedKeys, kid: &str) -> Result<DecodingKey, VerifyError> {
    cached
        .keys
        .get(kid)
        .cloned()
        .ok_or_else(|| VerifyError::UnknownKey(kid.to_owned()))
}

fn max_age(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(CACHE_CONTROL)?
        .to_str()
        .ok()?
        .split(',')
        .find_map(|directive| directive.trim().strip_prefix("max-age=")?.parse().ok())
        .map(Duration::from_secs)
}
