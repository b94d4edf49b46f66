pub mod auth;
pub mod configuration;
mod cors;
pub mod database;
pub mod identity;
mod routes;
mod server;
pub mod telemetry;

pub use configuration::Config;
pub use server::{Server, StartupError};

pub type Database = sqlx::MySql;
pub type DbPool = sqlx::Pool<Database>;
