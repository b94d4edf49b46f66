use anyhow::Context;
use dotenvy::dotenv;
use sunrise::{telemetry, Config, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    telemetry::init("sunrise", "info", std::io::stdout)
        .context("Failed to initialize telemetry")?;
    let config = Config::init()
        .map_err(|e| {
            tracing::error!(error = %e, "Invalid configuration");
            e
        })
        .context("Failed to initialize config")?;
    let server = Server::build(config)
        .await
        .map_err(|e| {
            tracing::error!(error.cause_chain = ?e, "Startup failed");
            e
        })
        .context("Failed to start the server")?;
    server.run().await.context("Server failed")
}
