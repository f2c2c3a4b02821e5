use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
    /// Upper bound on a request body, base64 overhead included.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub model_path: Option<String>,
}

/// Acceptance policy applied to decoded images before they reach the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_min_dimension")]
    pub min_width: u32,
    #[serde(default = "default_min_dimension")]
    pub min_height: u32,
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Content types the remote-fetch route decodes and annotates. Anything
    /// else is passed through untouched.
    #[serde(default = "default_accepted_mime_types")]
    pub accepted_mime_types: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.min_width == 0 || self.pipeline.min_height == 0 {
            return Err(Error::config(format!(
                "Minimum image dimensions must be positive, got {}x{}",
                self.pipeline.min_width, self.pipeline.min_height
            )));
        }

        if self.server.max_body_bytes == 0 {
            return Err(Error::config("server.max_body_bytes must be positive"));
        }

        if self.fetch.accepted_mime_types.is_empty() {
            return Err(Error::config("At least one accepted MIME type is required"));
        }

        Ok(())
    }
}

impl FetchConfig {
    /// Exact match against the accepted set; parameters such as `; charset=`
    /// make a content type unaccepted.
    pub fn accepts(&self, content_type: &str) -> bool {
        self.accepted_mime_types.contains(content_type)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_width: default_min_dimension(),
            min_height: default_min_dimension(),
            output_format: OutputFormat::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            accepted_mime_types: default_accepted_mime_types(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8555
}

fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_min_dimension() -> u32 {
    15
}

fn default_accepted_mime_types() -> BTreeSet<String> {
    ["image/jpg", "image/jpeg", "image/png", "image/webp"]
        .into_iter()
        .map(String::from)
        .collect()
}
