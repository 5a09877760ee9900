//! Rule configuration loading and saving.
//!
//! The configuration is a single file holding the ordered rule list. Its
//! location is resolved once at startup into a [`ConfigLocation`] and passed
//! around explicitly. The format follows the file extension: `.toml` files
//! are TOML, everything else is JSON.
//!
//! # Configuration File Format
//!
//! ```json
//! {
//!     "rules": [
//!         { "type": "extension", "pattern": ".pdf", "destination": "D:\\PDFs" },
//!         { "type": "filename", "pattern": "invoice", "destination": "D:\\Invoices" },
//!         { "type": "folder", "pattern": "scan", "destination": "D:\\Scans" }
//!     ]
//! }
//! ```
//!
//! The older flat format, `{ "mappings": { ".pdf": "D:\\PDFs" } }`, is still
//! read: every entry becomes an extension rule, in extension order. Saving
//! always writes the `rules` form.

use crate::rule::{Rule, RuleKind, RuleSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "HURIWAKE_CONFIG";

/// File name used next to the executable.
const DEFAULT_FILE_NAME: &str = "config.json";

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but does not parse.
    #[error("Invalid configuration in {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },
    /// Reading or writing the file failed.
    #[error("IO error on configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The configuration could not be encoded.
    #[error("Could not serialize configuration: {0}")]
    Serialize(String),
}

/// On-disk encoding of the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Everything the distributor reads from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub rules: RuleSet,
}

/// Serialized shape, including the legacy `mappings` table.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    rules: RuleSet,
    #[serde(default, skip_serializing)]
    mappings: BTreeMap<String, PathBuf>,
}

impl AppConfig {
    /// Parses configuration text.
    ///
    /// Legacy mappings are appended after the ordered rules, skipping any
    /// extension an ordered rule already covers. Mappings that cannot become a
    /// rule are logged and left out.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigInvalid` on syntax errors or invalid rules.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::ConfigInvalid {
            path: PathBuf::new(),
            reason,
        };

        let file: ConfigFile = if content.trim().is_empty() {
            ConfigFile::default()
        } else {
            match format {
                ConfigFormat::Json => {
                    serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?
                }
                ConfigFormat::Toml => toml::from_str(content).map_err(|e| invalid(e.to_string()))?,
            }
        };

        let mut rules = file.rules;
        for (extension, destination) in file.mappings {
            let rule = match Rule::new(RuleKind::Extension, &extension, destination) {
                Ok(rule) => rule,
                Err(e) => {
                    warn!(mapping = %extension, error = %e, "ignoring legacy mapping");
                    continue;
                }
            };
            if !rules.iter().any(|r| r.same_condition(&rule)) {
                rules.push_or_replace(rule);
            }
        }

        Ok(Self { rules })
    }

    /// Encodes the configuration in the ordered-rule form.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Serialize` if a destination cannot be encoded.
    pub fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        let file = ConfigFile {
            rules: self.rules.clone(),
            mappings: BTreeMap::new(),
        };
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(&file)
                .map_err(|e| ConfigError::Serialize(e.to_string())),
            ConfigFormat::Toml => {
                toml::to_string_pretty(&file).map_err(|e| ConfigError::Serialize(e.to_string()))
            }
        }
    }
}

/// The configuration file chosen for this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    path: PathBuf,
}

impl ConfigLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolves the configuration file to use.
    ///
    /// Candidates, first hit wins:
    /// 1. `explicit`, when given
    /// 2. the path in `HURIWAKE_CONFIG`
    /// 3. `config.json` next to the executable, if it exists
    /// 4. `~/.config/huriwake/config.toml`, if it exists
    /// 5. `config.json` next to the executable, to be created on first save
    pub fn resolve(explicit: Option<&Path>) -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self::resolve_with(explicit, |key| std::env::var_os(key), exe_dir.as_deref())
    }

    /// Resolution with the environment and executable folder supplied by the
    /// caller.
    ///
    /// # Arguments
    ///
    /// * `explicit` - Path given on the command line, if any
    /// * `env` - Looks up an environment variable
    /// * `exe_dir` - Folder holding the executable, if known
    pub fn resolve_with<E>(explicit: Option<&Path>, env: E, exe_dir: Option<&Path>) -> Self
    where
        E: Fn(&str) -> Option<OsString>,
    {
        if let Some(path) = explicit {
            return Self::new(path);
        }

        if let Some(path) = env(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
            return Self::new(path);
        }

        let beside_exe = exe_dir.map(|dir| dir.join(DEFAULT_FILE_NAME));
        if let Some(path) = &beside_exe
            && path.exists()
        {
            return Self::new(path.clone());
        }

        if let Some(home) = env("HOME").or_else(|| env("USERPROFILE")) {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("huriwake")
                .join("config.toml");
            if home_config.exists() {
                return Self::new(home_config);
            }
        }

        Self::new(beside_exe.unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ConfigFormat {
        ConfigFormat::from_path(&self.path)
    }

    /// Loads the configuration. A missing file is an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::ConfigInvalid` if it does not parse.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.path.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| ConfigError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        AppConfig::parse(&content, self.format()).map_err(|e| match e {
            ConfigError::ConfigInvalid { reason, .. } => ConfigError::ConfigInvalid {
                path: self.path.clone(),
                reason,
            },
            other => other,
        })
    }

    /// Writes `config`, creating missing parent folders.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be written.
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let content = config.render(self.format())?;
        let io_error = |e| ConfigError::Io {
            path: self.path.clone(),
            source: e,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(&self.path, content).map_err(io_error)
    }
}
