use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration, read from `<config_dir>/sprig/config.toml`.
/// Every field has a default so a missing file means a usable config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub semantic: SemanticConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Explicit database path; defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolve the database path: explicit config value, else
    /// `<data_dir>/sprig/tasks.sqlite3`, else a local fallback.
    #[must_use]
    pub fn resolve_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        dirs::data_dir().map_or_else(
            || PathBuf::from("sprig-tasks.sqlite3"),
            |dir| dir.join("sprig/tasks.sqlite3"),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    #[serde(default = "default_embed_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embed_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Cosine similarity floor for a duplicate match.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after the first failure.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            endpoint: default_embed_endpoint(),
            model: default_embed_model(),
            api_key_env: default_api_key_env(),
            threshold: default_threshold(),
            top_k: default_top_k(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_extract_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_extract_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            endpoint: default_extract_endpoint(),
            model: default_extract_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embed_endpoint() -> String {
    "https://api.openai.com/v1/embeddings".to_string()
}

fn default_embed_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_extract_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_extract_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "SPRIG_API_KEY".to_string()
}

const fn default_threshold() -> f32 {
    0.9
}

const fn default_top_k() -> usize {
    5
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_retries() -> u32 {
    2
}

/// Load config from an explicit path, or the platform default location.
/// A missing file yields defaults; a malformed file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let Some(config_dir) = dirs::config_dir() else {
                return Ok(Config::default());
            };
            config_dir.join("sprig/config.toml")
        }
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}
