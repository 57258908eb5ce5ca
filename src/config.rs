use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::Result;

/// Runtime configuration. Loaded from `config.toml` when present, otherwise
/// built-in defaults matching the crawled sites' tolerances.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base origin relative fetch paths are resolved against.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Minimum interval between any two outbound requests, host-agnostic.
    pub request_delay_secs: f64,
    /// Maximum attempts per fetch before giving up on that unit of work.
    pub max_retries: u32,
    /// Root directory for CSV output artifacts.
    pub output_dir: String,
    /// Seasons crawled by `--all-seasons`, newest first.
    pub seasons: Vec<String>,
    /// Cap on paginated stat-table crawls.
    pub max_stat_pages: usize,
    /// Hosts that block the default header set and need the full
    /// browser-like profile instead.
    pub verbose_header_hosts: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://nba.hupu.com".to_string(),
            request_timeout_secs: 10,
            request_delay_secs: 1.5,
            max_retries: 3,
            output_dir: "output".to_string(),
            seasons: vec![
                "2024-25".to_string(),
                "2023-24".to_string(),
                "2022-23".to_string(),
                "2021-22".to_string(),
                "2020-21".to_string(),
            ],
            max_stat_pages: 10,
            verbose_header_hosts: vec!["basketball-reference.com".to_string()],
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        if !Path::new(config_path).exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&config_content)?;
        info!("loaded configuration from {}", config_path);
        Ok(config)
    }
}
