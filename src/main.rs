/// Teamhub - team collaboration server
///
/// Serves the account, team, invitation and calendar APIs and runs the
/// background maintenance jobs.
use std::sync::Arc;
use teamhub::{
    config::{LogFormat, DEFAULT_LOG_FILTER},
    jobs, server, AppContext, ServerConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    let (pretty, json) = match config.logging.format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(pretty)
        .with(json)
        .init();

    tracing::info!("Teamhub v{} starting", env!("CARGO_PKG_VERSION"));

    // Create application context
    let ctx = Arc::new(AppContext::new(config).await?);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}
