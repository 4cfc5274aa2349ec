//! Application configuration for docmirror.
//!
//! User config lives at `~/.docmirror/docmirror.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocMirrorError, Result};
use crate::types::{DEFAULT_OUTPUT, DEFAULT_PREFIX, DEFAULT_TIMEOUT_SECS};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docmirror.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docmirror";

// ---------------------------------------------------------------------------
// Config structs (matching docmirror.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Defaults for `docmirror run`.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Only sitemap URLs starting with this string are converted.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Output file for the combined Markdown document.
    #[serde(default = "default_output")]
    pub output: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            output: default_output(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.into()
}
fn default_output() -> String {
    DEFAULT_OUTPUT.into()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl AppConfig {
    /// Reject values that cannot drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.defaults.timeout_secs == 0 {
            return Err(DocMirrorError::config("timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docmirror/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocMirrorError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docmirror/docmirror.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocMirrorError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        DocMirrorError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocMirrorError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| DocMirrorError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocMirrorError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
