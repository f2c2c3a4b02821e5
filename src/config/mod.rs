mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, io::ErrorKind, path::Path};
use tracing::{debug, info};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

pub async fn load() -> Result<Config> {
    let explicit = env::var("CONFIG_PATH").ok();
    let config_path = explicit
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    debug!("Loading configuration from: {}", config_path);

    let mut config = match tokio::fs::read_to_string(&config_path).await {
        Ok(config_str) => serde_yaml::from_str::<Config>(&config_str)?,
        // Only the implicit default may be absent
        Err(e) if e.kind() == ErrorKind::NotFound && explicit.is_none() => {
            info!("No {} found, using built-in defaults", config_path);
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    if let Ok(model_path) = env::var("MODEL_PATH") {
        config.engine.model_path = Some(model_path);
    }

    config.validate()?;
    Ok(config)
}

pub async fn load_from(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config_str = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let config: Config = serde_yaml::from_str(&config_str)?;
    config.validate()?;
    Ok(config)
}
