//! Layered scan settings.
//!
//! Settings are merged from, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. a TOML file: `--config FILE`, or `config.toml` in the platform config
//!    directory (`~/.config/dupescan/` on Linux)
//! 3. environment variables prefixed `DUPESCAN_`, e.g. `DUPESCAN_SKIP_HIDDEN=true`
//! 4. command-line flags, applied by the caller afterwards
//!
//! ```toml
//! follow_symlinks = false
//! skip_hidden = true
//! ignore_patterns = ["target/", "*.tmp"]
//! buffer_size = 131072
//! retain_singletons = true
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::EngineConfig;
use crate::scanner::{WalkerConfig, DEFAULT_BUFFER_SIZE};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DUPESCAN_";

/// Errors from loading settings.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A config file given explicitly does not exist.
    #[error("Config file not found: {0}")]
    Missing(PathBuf),

    /// A layer could not be parsed or has a value of the wrong type.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

/// Persistent defaults for scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Descend into symlinked directories and hash symlinked files.
    pub follow_symlinks: bool,
    /// Skip entries whose name starts with a dot.
    pub skip_hidden: bool,
    /// Gitignore-style patterns excluded from every scan.
    pub ignore_patterns: Vec<String>,
    /// Read buffer size for hashing, in bytes.
    pub buffer_size: usize,
    /// Keep digests only one file produced.
    pub retain_singletons: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            retain_singletons: true,
        }
    }
}

impl Settings {
    /// Load settings from every layer.
    ///
    /// `file` overrides the platform config path. A missing platform file is
    /// fine; a missing explicit file is not.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit file is missing or any layer
    /// holds malformed TOML or mistyped values.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = file {
            if !path.exists() {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
        }

        let path = file.map(Path::to_path_buf).or_else(Self::default_path);
        match &path {
            Some(p) => log::debug!("Loading settings from {}", p.display()),
            None => log::debug!("No config directory available, using defaults"),
        }

        let settings: Self = Self::figment(path.as_deref()).extract()?;
        Ok(settings)
    }

    /// Defaults merged with an optional TOML file and the environment.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        Self::file_figment(file).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Defaults merged with an optional TOML file, ignoring the environment.
    #[must_use]
    pub fn file_figment(file: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        match file {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment,
        }
    }

    /// `config.toml` in the platform config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupescan", "dupescan")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Walker settings for a scan.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(
            self.follow_symlinks,
            self.skip_hidden,
            self.ignore_patterns.clone(),
        )
    }

    /// Engine settings for a scan.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_walker_config(self.walker_config())
            .with_buffer_size(self.buffer_size)
            .with_retain_singletons(self.retain_singletons)
    }
}
