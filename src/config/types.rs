use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL used when building share link URLs. Defaults to
    /// `http://{host}:{port}` when unset.
    #[serde(default)]
    pub public_base_url: Option<String>,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// The base URL share links are formed against.
    pub fn resolved_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Enable bearer-token authentication for the API routes
    #[serde(default)]
    pub enabled: bool,

    /// Accepted tokens (used with Authorization: Bearer header)
    #[serde(default)]
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding the database and the media staging area
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("clipvault.db")
    }

    /// Root of the media staging area.
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}

/// Default upload constraints, applied when a request does not carry its own.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: i64,

    #[serde(default = "default_min_duration")]
    pub min_duration_seconds: f64,

    #[serde(default = "default_max_duration")]
    pub max_duration_seconds: f64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_max_size_bytes() -> i64 {
    512 * 1024 * 1024
}

fn default_min_duration() -> f64 {
    1.0
}

fn default_max_duration() -> f64 {
    4.0 * 3600.0
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: None,
            auth: AuthConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
            min_duration_seconds: default_min_duration(),
            max_duration_seconds: default_max_duration(),
        }
    }
}
