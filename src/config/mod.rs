mod settings;

pub use settings::{BackendSettings, Config, ExportSettings};

use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AgeingError, Result};

/// Get the config directory path (~/.ageing/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "ageing") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.ageing/
    let home = dirs_home().ok_or_else(|| {
        AgeingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".ageing"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs_home() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(AgeingError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| AgeingError::ConfigParse { path, source: e })
}

/// Resolve the export output directory, relative paths against the config
/// directory.
pub fn resolve_output_dir(output_dir: &str, config_dir: &Path) -> PathBuf {
    if output_dir.is_empty() {
        return config_dir.join("output");
    }
    let expanded = expand_path(output_dir);
    if expanded.is_relative() {
        config_dir.join(expanded)
    } else {
        expanded
    }
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[backend]
# Base URL of the accounting backend serving the report RPC endpoint.
url = "http://localhost:8069"
# database = "production"      # optional
# api_key = "secret"           # optional
timeout_secs = 30

[export]
output_dir = "~/.ageing/output"
"#;
