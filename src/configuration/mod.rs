mod application;
mod database;
mod identity;

pub use application::ApplicationConfig;
pub use database::DatabaseConfig;
pub use identity::IdentityConfig;

use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_KEYS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub application: ApplicationConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration")]
    Load(#[from] config::ConfigError),
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("PORT must be a number between 1 and 65535, got {0:?}")]
    InvalidPort(String),
}

/// Flat view of the environment, keys lower-cased by `config`.
#[derive(Deserialize)]
struct Settings {
    #[serde(default)]
    db_user: Option<String>,
    #[serde(default)]
    db_password: Option<Secret<String>>,
    #[serde(default)]
    db_name: Option<String>,
    #[serde(default)]
    db_host: Option<String>,
    #[serde(default)]
    port: Option<String>,
    listen_host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    db_timeout_secs: u64,
    #[serde(default)]
    google_cloud_project: Option<String>,
    identity_keys_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    identity_timeout_secs: u64,
}

impl Config {
    pub fn init() -> Result<Self, ConfigError> {
        Self::load(config::Environment::default())
    }

    pub fn load<S>(source: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let base_path = std::env::current_dir()
            .map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;
        config::Config::builder()
            .set_default("listen_host", "0.0.0.0")?
            .set_default("db_timeout_secs", 5)?
            .set_default("identity_keys_url", DEFAULT_KEYS_URL)?
            .set_default("identity_timeout_secs", 5)?
            .add_source(
                config::File::from(base_path.join("config").join("base.yaml"))
                    .required(false),
            )
            .add_source(source)
            .build()?
            .try_deserialize::<Settings>()?
            .try_into()
    }
}

impl TryFrom<Settings> for Config {
    type Error = ConfigError;

    fn try_from(s: Settings) -> Result<Self, Self::Error> {
        let present = |v: &Option<String>| v.as_deref().map_or(false, |v| !v.is_empty());
        let mut missing = Vec::new();
        if !present(&s.db_user) {
            missing.push("DB_USER");
        }
        if !s
            .db_password
            .as_ref()
            .map_or(false, |p| !p.expose_secret().is_empty())
        {
            missing.push("DB_PASSWORD");
        }
        if !present(&s.db_name) {
            missing.push("DB_NAME");
        }
        if !present(&s.db_host) {
            missing.push("DB_HOST");
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let port = match s.port.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_PORT,
            Some(p) => p
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| ConfigError::InvalidPort(p.to_owned()))?,
        };

        Ok(Self {
            application: ApplicationConfig {
                host: s.listen_host,
                port,
            },
            database: DatabaseConfig {
                user: s.db_user.unwrap_or_default(),
                password: s.db_password.unwrap_or_else(|| Secret::new(String::new())),
                name: s.db_name.unwrap_or_default(),
                socket: s.db_host.unwrap_or_default().into(),
                timeout: Duration::from_secs(s.db_timeout_secs),
            },
            identity: IdentityConfig {
                project_id: s.google_cloud_project.filter(|p| !p.is_empty()),
                keys_url: s.identity_keys_url,
                timeout: Duration::from_secs(s.identity_timeout_secs),
            },
        })
    }
}
