use anyhow::Context;
use convai_realtime::{ConfigBuilder, SignedUrlClient};
use echoes_api::config::Config;
use echoes_api::{AppState, app};
use echoes_core::Catalog;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    // Checked once; the health route keeps reporting what is missing.
    for missing in config.missing() {
        warn!("{}; session requests will fail until it is set", missing);
    }

    let catalog = match &config.topics_dir {
        Some(dir) => Catalog::load_dir(dir)
            .with_context(|| format!("failed to load topics from {}", dir.display()))?,
        None => Catalog::builtin().context("failed to load built-in topics")?,
    };
    info!("Loaded {} topics", catalog.topics().len());

    let provider = ConfigBuilder::new()
        .with_base_url(&config.api_base)
        .with_api_key(
            config
                .api_key
                .clone()
                .unwrap_or_else(|| SecretString::from("")),
        )
        .build();

    let state = AppState {
        catalog: Arc::new(catalog),
        agent_id: config.agent_id.clone(),
        has_api_key: config.has_api_key(),
        issuer: Arc::new(SignedUrlClient::new(provider)),
    };

    info!("Starting session broker, listening on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
