//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info, warn};
use thiserror::Error;

use storyweave::{
    StoryweaveError,
    config::{AppConfig, LayoutConfig},
    library::Library,
};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Invalid layout setting `{field}`: {value} must be positive")]
    InvalidLayout { field: &'static str, value: f32 },

    #[error("Invalid library `{name}`: {reason}")]
    InvalidLibrary { name: String, reason: &'static str },
}

impl From<ConfigError> for StoryweaveError {
    fn from(err: ConfigError) -> Self {
        StoryweaveError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (storyweave/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, StoryweaveError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("storyweave/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "storyweave", "storyweave") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, StoryweaveError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    check_layout(config.layout())?;
    check_libraries(config.libraries())?;
    Ok(config)
}

fn check_layout(layout: &LayoutConfig) -> Result<(), ConfigError> {
    [
        ("node_width", layout.node_width()),
        ("node_height", layout.node_height()),
        ("spacing_y", layout.spacing_y()),
        ("placeholder_size", layout.placeholder_size()),
    ]
    .into_iter()
    .find(|(_, value)| *value <= 0.0 || !value.is_finite())
    .map_or(Ok(()), |(field, value)| {
        Err(ConfigError::InvalidLayout { field, value })
    })
}

/// Library names carry a version (`"H5P.Text 1.1"`) so that saved nodes can
/// be matched against them; titles label node boxes.
fn check_libraries(libraries: &[Library]) -> Result<(), ConfigError> {
    let mut seen = Vec::with_capacity(libraries.len());
    for library in libraries {
        let name = library.name();
        let invalid = |reason| ConfigError::InvalidLibrary {
            name: name.to_string(),
            reason,
        };

        let Some((machine_name, version)) = name.split_once(' ') else {
            return Err(invalid("expected `<machine name> <major>.<minor>`"));
        };
        let versioned = version
            .split_once('.')
            .is_some_and(|(major, minor)| is_number(major) && is_number(minor));
        if machine_name.is_empty() || !versioned {
            return Err(invalid("expected `<machine name> <major>.<minor>`"));
        }
        if library.title().trim().is_empty() {
            return Err(invalid("title is empty"));
        }

        if seen.contains(&name) {
            warn!(library = name; "Library configured twice, the later title wins");
        }
        seen.push(name);
    }

    debug!(libraries_len = libraries.len(); "Configured libraries checked");
    Ok(())
}

fn is_number(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit())
}
