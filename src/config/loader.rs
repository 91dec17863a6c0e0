use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::RegistryConfig;
use crate::errors::{ReflectError, Result};
use crate::filter::FilterKind;

pub const CONFIG_FILE_NAME: &str = ".shapebind.toml";

/// Environment variable overriding the configured filter policy
pub const FILTER_ENV_VAR: &str = "SHAPEBIND_FILTER";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse config from a TOML string
pub fn parse_config(contents: &str) -> Result<RegistryConfig> {
    toml::from_str::<RegistryConfig>(contents)
        .map_err(|e| ReflectError::config(format!("failed to parse {CONFIG_FILE_NAME}: {e}")))
}

/// Load and parse a specific config file.
pub fn load_config_from(path: &Path) -> anyhow::Result<RegistryConfig> {
    let contents = read_config_file(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&contents).map_err(|e| match e {
        ReflectError::Config { message, .. } => {
            ReflectError::config_with_path(message, path).into()
        }
        other => other.into(),
    })
}

/// Pure function to try loading config from a specific path
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<RegistryConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{} ({}). Using defaults.", e, config_path.display());
            None
        }
    }
}

/// Handle file read errors with appropriate logging
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // Only log actual errors, not "file not found"
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Apply the filter override from the environment, if valid.
#[must_use]
pub fn apply_env_overrides(mut config: RegistryConfig, filter: Option<String>) -> RegistryConfig {
    if let Some(raw) = filter {
        match raw.parse::<FilterKind>() {
            Ok(kind) => config.filter = kind,
            Err(e) => log::warn!("Ignoring {FILTER_ENV_VAR}: {e}"),
        }
    }
    config
}

/// Search `start` and its ancestors for a config file. Environment
/// overrides are not applied.
#[must_use]
pub fn load_config_in(start: PathBuf) -> RegistryConfig {
    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            RegistryConfig::default()
        })
}

/// Discover the config from the current directory upwards, then apply
/// environment overrides.
pub fn load_config() -> RegistryConfig {
    let config = match std::env::current_dir() {
        Ok(dir) => load_config_in(dir),
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            RegistryConfig::default()
        }
    };
    apply_env_overrides(config, std::env::var(FILTER_ENV_VAR).ok())
}
