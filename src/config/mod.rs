//! Configuration resolution.
//!
//! CLI arguments provide defaults; an optional TOML file overrides them,
//! field by field.

use crate::model::Platform;
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Values read from the optional TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub ollama_url: Option<String>,
    pub ollama_model: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub platform: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse config file {:?}", path))
    }
}

/// CLI arguments that can be overridden by the TOML config.
/// This struct mirrors the binary's argument set.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub ollama_url: String,
    pub ollama_model: String,
    pub latitude: f64,
    pub longitude: f64,
    pub platform: Platform,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub ollama_url: String,
    pub ollama_model: String,
    pub latitude: f64,
    pub longitude: f64,
    pub platform: Platform,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| anyhow!("db_path must be specified via --db-path or in config file"))?;

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let ollama_url = file.ollama_url.unwrap_or_else(|| cli.ollama_url.clone());
        let ollama_model = file
            .ollama_model
            .unwrap_or_else(|| cli.ollama_model.clone());

        let latitude = file.latitude.unwrap_or(cli.latitude);
        let longitude = file.longitude.unwrap_or(cli.longitude);
        if !(-90.0..=90.0).contains(&latitude) {
            bail!("Latitude out of range: {}", latitude);
        }
        if !(-180.0..=180.0).contains(&longitude) {
            bail!("Longitude out of range: {}", longitude);
        }

        let platform = match file.platform {
            Some(s) => s
                .parse()
                .map_err(|e| anyhow!("Invalid platform in config file: {}", e))?,
            None => cli.platform,
        };

        Ok(Self {
            db_path,
            ollama_url,
            ollama_model,
            latitude,
            longitude,
            platform,
        })
    }
}
