use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Site-wide settings for the post-processing passes.
///
/// Per-document values (`full_path`, `base_path`) are not stored here; the
/// engine derives them for each page it processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Absolute URL of the site root, e.g. `https://cpprefjp.github.io`.
    pub base_url: String,
    /// Appended to internal links after the `.md` suffix is removed.
    pub extension: String,
    /// Emit links relative to the current document instead of absolute URLs.
    pub use_relative_link: bool,
    /// `owner/name` of the repository hosting images.
    pub image_repo: String,
    /// Serve hosted images from the local `static/image/` directory.
    pub use_static_image: bool,
    /// Directory holding the `.md` pages, used to build the link registry.
    pub pages_root: Option<PathBuf>,
    /// JSON dictionary of defined words to link in page text.
    pub defined_words: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            extension: String::new(),
            use_relative_link: false,
            image_repo: "cpprefjp/image".to_string(),
            use_static_image: false,
            pages_root: None,
            defined_words: None,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config = Self::from_toml_str(&content).map_err(|source| {
            ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        // Expand shell variables and tilde in configured paths
        config.pages_root = config
            .pages_root
            .map(|root| Self::expand_path(&root).unwrap_or(root));
        config.defined_words = config
            .defined_words
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Parse a config from TOML text without touching the filesystem.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markdown-sitepost");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
