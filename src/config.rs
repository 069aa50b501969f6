use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Mount point of the file API
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Maximum request body size for uploads (in bytes)
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,

    /// Directory holding the client bundle served next to the API
    #[serde(default)]
    pub public_dir: Option<PathBuf>,

    /// Document served for paths the static directory does not contain
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// Answer CORS preflights for any origin
    #[serde(default)]
    pub allow_cors: bool,
}

fn default_base_path() -> String {
    "/api/v1/files".to_string()
}

fn default_max_upload_size() -> u64 {
    100 * 1024 * 1024 // 100 MB
}

fn default_index_file() -> String {
    "index.html".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            max_upload_size: default_max_upload_size(),
            public_dir: None,
            index_file: default_index_file(),
            allow_cors: false,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Base path normalized to a leading slash and no trailing slash.
    pub fn mount_path(&self) -> String {
        let trimmed = self.base_path.trim_matches('/');
        format!("/{}", trimmed)
    }
}
