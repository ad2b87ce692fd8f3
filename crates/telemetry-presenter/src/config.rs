//! Presenter configuration.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level shape of the shared pipeline config file. The producer and
/// bridge tools read their own sections from the same file; the presenter
/// only cares about `presenter` and ignores the rest.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    presenter: PresenterConfig,
}

/// Presenter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenterConfig {
    /// Broker host. A plain hostname, `host:port`, or a `tcp://`/`mqtt://`
    /// URL are all accepted.
    pub broker: String,

    /// Broker port, used when `broker` does not carry one itself.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Topic filters to subscribe to.
    pub topics: Vec<String>,

    /// Optional log file. Console logging is always on.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Optional MQTT client id. A random one is generated when absent.
    #[serde(default)]
    pub client_id: Option<String>,
}

fn default_port() -> u16 {
    1883
}

impl PresenterConfig {
    /// Load the presenter section from a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid JSON, has no
    /// `presenter` section, or lists no topics.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let file: ConfigFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let config = file.presenter;

        if config.broker.is_empty() {
            bail!("Config file {}: broker must not be empty", path.display());
        }
        if config.topics.is_empty() {
            bail!(
                "Config file {}: no topics to subscribe to",
                path.display()
            );
        }

        Ok(config)
    }
}
