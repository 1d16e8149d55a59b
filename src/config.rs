use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::sync::merge::MergePolicy;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub cache: CacheConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub merge: MergePolicy,
    #[serde(default = "default_replica_capacity")]
    pub replica_capacity: usize,
    #[serde(default)]
    pub empty_remote_overrides: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            merge: MergePolicy::default(),
            replica_capacity: default_replica_capacity(),
            empty_remote_overrides: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub path: String,
    /// Size of a single log file in MB before rolling over
    pub size: u64,
    pub max_files: usize,
}

fn default_max_connections() -> u32 {
    5
}

fn default_replica_capacity() -> usize {
    16
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_text = fs::read_to_string(Path::new(path))?;
    let config: Config = toml::from_str(&config_text)?;
    Ok(config)
}
