//! Extension map configuration.
//!
//! The extension map comes from one of three places:
//! - the built-in table ([`ExtensionMap::builtin`])
//! - a `config.json` file stored next to the running executable
//! - an explicit JSON file path
//!
//! # Configuration File Format
//!
//! The file is a single flat JSON object mapping extensions (with the leading
//! dot) to category names:
//!
//! ```json
//! {
//!     ".md": "notes",
//!     ".jpg": "image",
//!     ".pdf": "document"
//! }
//! ```
//!
//! Anything else (arrays, nested objects, non-string values) is rejected.

use crate::file_category::ExtensionMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up beside the executable.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Errors that can occur while loading the extension map.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The path of the running executable could not be determined.
    #[error("Could not locate the running executable: {0}")]
    ExecutableLocation(#[source] std::io::Error),

    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// IO error while reading configuration.
    #[error("IO error reading configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not a flat JSON object of strings.
    #[error("Invalid configuration {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A category value cannot be used as a directory name.
    #[error(
        "Invalid category '{category}' for extension '{extension}' in {}",
        .path.display()
    )]
    InvalidCategory {
        path: PathBuf,
        extension: String,
        category: String,
    },
}

/// Where the extension map is read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// The built-in document/image table.
    Builtin,
    /// `config.json` in the directory that holds the executable.
    #[default]
    BesideExecutable,
    /// An explicit configuration file.
    File(PathBuf),
}

impl ConfigSource {
    /// Loads the extension map from this source.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is missing, unreadable or malformed,
    /// or if the executable's own location cannot be resolved.
    pub fn load(&self) -> Result<ExtensionMap, ConfigError> {
        match self {
            ConfigSource::Builtin => {
                log::info!("Using built-in extension map");
                Ok(ExtensionMap::builtin())
            }
            ConfigSource::BesideExecutable => load_from_file(&executable_config_path()?),
            ConfigSource::File(path) => load_from_file(path),
        }
    }
}

/// Resolves `config.json` next to the running executable.
///
/// The working directory plays no part, so the tool behaves the same no
/// matter where it is invoked from.
pub fn executable_config_path() -> Result<PathBuf, ConfigError> {
    let exe_path = std::env::current_exe().map_err(ConfigError::ExecutableLocation)?;
    Ok(config_path_beside(&exe_path))
}

/// Returns the configuration path that belongs to a given executable path.
pub fn config_path_beside(exe_path: &Path) -> PathBuf {
    exe_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(CONFIG_FILE_NAME)
}

/// Load the extension map from a specific file.
///
/// Keys are lowercased after parsing so that `.MD` and `.md` are the same
/// extension.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if file does not exist.
/// Returns `ConfigError::Malformed` if JSON parsing fails.
/// Returns `ConfigError::InvalidCategory` if a category is not a plain directory name.
/// Returns `ConfigError::Io` if file cannot be read.
pub fn load_from_file(path: &Path) -> Result<ExtensionMap, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let map = serde_json::from_str::<ExtensionMap>(&content)
        .map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })?
        .normalized();

    if let Some((extension, category)) = map.first_invalid_category() {
        return Err(ConfigError::InvalidCategory {
            path: path.to_path_buf(),
            extension: extension.to_string(),
            category: category.to_string(),
        });
    }

    log::info!(
        "Loaded {} extension mappings from {}",
        map.len(),
        path.display()
    );
    Ok(map)
}
