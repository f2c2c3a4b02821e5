use anyhow::{Context, Result, bail};
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};
use vision_gate::{config, server};

/// Install the JSON subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(configured: &str) -> Result<String> {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| configured.to_string());
    if level.parse::<LevelFilter>().is_err() {
        bail!(
            "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
            level
        );
    }

    let filter = EnvFilter::try_new(&level)
        .with_context(|| format!("Cannot build log filter from '{}'", level))?;
    tracing_subscriber::fmt().with_env_filter(filter).json().init();
    Ok(level)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()
        .await
        .context("Failed to load vision-gate configuration")?;
    let level = init_tracing(&config.server.logs.level)?;

    info!(
        listen = %format!("{}:{}", config.server.host, config.server.port),
        log_level = %level,
        "vision-gate starting"
    );
    info!(
        model_path = config.engine.model_path.as_deref().unwrap_or("<none>"),
        min_width = config.pipeline.min_width,
        min_height = config.pipeline.min_height,
        output = config.pipeline.output_format.content_type(),
        max_body_bytes = config.server.max_body_bytes,
        "Detection pipeline configured"
    );
    info!(
        "Accepting remote content types: {:?}",
        config.fetch.accepted_mime_types
    );

    server::run(config).await.context("HTTP server stopped")
}
