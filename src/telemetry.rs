use tracing::{subscriber::set_global_default, Subscriber};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{
    fmt::MakeWriter, prelude::__tracing_subscriber_SubscriberExt, EnvFilter, Registry,
};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Failed to bridge `log` records into tracing")]
    Log(#[from] tracing_log::log::SetLoggerError),
    #[error("A global tracing subscriber is already installed")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Installs a bunyan-formatted JSON subscriber writing to `sink`.
///
/// `RUST_LOG` overrides `env_filter` when set.
pub fn init<Sink>(name: &str, env_filter: &str, sink: Sink) -> Result<(), TelemetryError>
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    LogTracer::init()?;
    set_global_default(subscriber(name, env_filter, sink))?;
    Ok(())
}

fn subscriber<Sink>(name: &str, env_filter: &str, sink: Sink) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    Registry::default()
        .with(filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(name.into(), sink))
}
