//! Configuration file support for runbun
//!
//! Reads from .runbun/config.toml, then applies environment overrides
//! (`PORT`, `API_PASSWORD`, `SHEETS_ACCESS_TOKEN`).

use crate::dispatcher::DEFAULT_BATCH_SIZE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Companion app authentication
    #[serde(default)]
    pub auth: AuthConfig,

    /// Google Sheets API settings
    #[serde(default)]
    pub sheets: SheetsConfig,
}

/// Which set of endpoints the server exposes.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// `/updateRun`, blocks found by scanning run id markers
    #[default]
    Locator,
    /// `/initRun` and `/updatePokemonCards`, newest run at the top
    CreationOrder,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Default: "0.0.0.0"
    #[serde(default = "default_host")]
    pub host: String,

    /// Default: 8080
    #[serde(default = "default_port")]
    pub port: u16,

    /// Threads answering requests. Default: 4
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub variant: Variant,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct AuthConfig {
    /// Expected bearer token of `/updateRun`
    #[serde(default)]
    pub api_password: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SheetsConfig {
    /// Default: "https://sheets.googleapis.com"
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// OAuth access token with the spreadsheets scope
    #[serde(default)]
    pub access_token: String,

    /// Requests per `batchUpdate` call. Default: 200
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Default: 30
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    4
}

fn default_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
            variant: Variant::default(),
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            access_token: String::new(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load config from an explicit path, or from .runbun/config.toml
    /// Returns default config if no file exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit.map(Path::to_path_buf).or_else(Self::find_config_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&contents).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".runbun").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Environment wins over the file. `lookup` is `std::env::var` outside tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(password) = lookup("API_PASSWORD") {
            self.auth.api_password = password;
        }
        if let Some(token) = lookup("SHEETS_ACCESS_TOKEN") {
            self.sheets.access_token = token;
        }
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
