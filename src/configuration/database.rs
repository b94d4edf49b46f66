use std::{path::PathBuf, time::Duration};

use secrecy::{ExposeSecret, Secret};
use sqlx::mysql::MySqlConnectOptions;

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: Secret<String>,
    pub name: String,
    /// Unix socket of the MySQL server (`DB_HOST`).
    pub socket: PathBuf,
    pub timeout: Duration,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .socket(&self.socket)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(&self.name)
    }

    /// Data source name with the password masked, for diagnostics.
    pub fn redacted_dsn(&self) -> String {
        format!(
            "{}:***@unix({})/{}",
            self.user,
            self.socket.display(),
            self.name
        )
    }
}
