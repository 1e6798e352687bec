//! Configuration file parsing and discovery

use crate::config::schema::validate_config;
use crate::config::types::Config;
use crate::error::{BriskError, ConfigError, ConfigResult};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &["brisk.yml", "brisk.yaml"];

/// Env file loaded beside the config when `env-file` is not given
const DEFAULT_ENV_FILE: &str = ".env";

/// Find the configuration file by searching current and parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the configuration file starting from a specific directory
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = current_dir.join(file_name);
            searched_paths.push(config_path.display().to_string());

            if config_path.is_file() {
                return Ok(config_path);
            }
        }

        // Try parent directory
        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                // Reached root without finding config
                return Err(ConfigError::NotFound(searched_paths.join(", ")));
            }
        }
    }
}

/// Parse and validate a configuration file from a path
pub fn parse_config_file(path: &Path) -> Result<Config, BriskError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ConfigError::Invalid(format!("Failed to read {}: {}", path.display(), e))
    })?;

    parse_config(&contents)
}

/// Parse and validate configuration from a string
pub fn parse_config(yaml: &str) -> Result<Config, BriskError> {
    let config: Config = serde_yaml::from_str(yaml)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load the env files a configuration asks for into the process environment
///
/// Variables already present in the environment are never overridden. Without an
/// `env-file` key, a `.env` beside the config file is loaded if it exists.
pub fn load_env_files(config: &Config, config_path: &Path) -> ConfigResult<Vec<PathBuf>> {
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let (files, must_exist): (Vec<PathBuf>, bool) = match &config.env_file {
        Some(files) => (files.iter().map(|f| base_dir.join(f)).collect(), true),
        None => (vec![base_dir.join(DEFAULT_ENV_FILE)], false),
    };

    let mut loaded = Vec::new();
    for path in files {
        if !must_exist && !path.is_file() {
            continue;
        }

        dotenvy::from_path(&path).map_err(|e| ConfigError::EnvFile {
            path: path.clone(),
            error: e.to_string(),
        })?;
        tracing::debug!("loaded env file {}", path.display());
        loaded.push(path);
    }

    Ok(loaded)
}
