mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./clipvault.toml",
        "~/.config/clipvault/config.toml",
        "/etc/clipvault/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.auth.enabled && config.server.auth.tokens.is_empty() {
        anyhow::bail!("Auth is enabled but no tokens are configured");
    }

    if config.limits.max_size_bytes <= 0 {
        anyhow::bail!("max_size_bytes must be positive");
    }

    if config.limits.min_duration_seconds < 0.0
        || config.limits.min_duration_seconds >= config.limits.max_duration_seconds
    {
        anyhow::bail!("min_duration_seconds must be non-negative and less than max_duration_seconds");
    }

    Ok(())
}
