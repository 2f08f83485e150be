//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first hit wins:
//! 1. An explicit path passed to [`Config::load`] (the CLI `--config` flag)
//! 2. `$GITWEAVE_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/gitweave/config.toml`
//! 4. `~/.gitweave/config.toml`
//!
//! A missing file is not an error; defaults apply.
//!
//! # Example
//!
//! ```no_run
//! use gitweave::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("git binary: {}", config.git_binary());
//! println!("cut context: {} lines", config.diff_cut_before_lines());
//! ```

pub mod schema;

pub use schema::{DiffCutDefaults, FileConfig, HashDefaults, WalkDefaults};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hash::{AggregationType, HashType};

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: FileConfig,
    /// Where the file was loaded from, if anywhere
    path: Option<PathBuf>,
}

impl Config {
    pub const DEFAULT_BEFORE_LINES: usize = 2;
    pub const DEFAULT_AFTER_LINES: usize = 2;
    pub const DEFAULT_LINE_LIMIT: usize = 40;
    pub const DEFAULT_MAX_LINE_LENGTH: usize = 200;
    pub const DEFAULT_PAGE_SIZE: usize = 50;

    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated. An explicit path that does not exist is a read error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        let Some(path) = path else {
            return Ok(Self::default());
        };

        let file = Self::read_file(&path)?;
        file.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Self {
            file,
            path: Some(path),
        })
    }

    /// Find the first existing config file in the default locations.
    fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GITWEAVE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gitweave/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = Self::home_config_path().ok()?;
        path.exists().then_some(path)
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// `~/.gitweave/config.toml`.
    pub fn home_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".gitweave/config.toml"))
    }

    /// Path the configuration was loaded from.
    pub fn source_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // =========================================================================
    // Accessors with defaults
    // =========================================================================

    /// Git binary to execute. Defaults to `git`.
    pub fn git_binary(&self) -> &str {
        self.file.git_binary.as_deref().unwrap_or("git")
    }

    /// Parent directory for scratch repositories.
    pub fn scratch_dir(&self) -> PathBuf {
        self.file
            .scratch_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn diff_cut_before_lines(&self) -> usize {
        self.diff_cut()
            .and_then(|d| d.before_lines)
            .unwrap_or(Self::DEFAULT_BEFORE_LINES)
    }

    pub fn diff_cut_after_lines(&self) -> usize {
        self.diff_cut()
            .and_then(|d| d.after_lines)
            .unwrap_or(Self::DEFAULT_AFTER_LINES)
    }

    pub fn diff_cut_line_limit(&self) -> usize {
        self.diff_cut()
            .and_then(|d| d.line_limit)
            .unwrap_or(Self::DEFAULT_LINE_LIMIT)
    }

    /// Longest captured line kept verbatim; longer lines are truncated.
    pub fn max_line_length(&self) -> usize {
        self.diff_cut()
            .and_then(|d| d.max_line_length)
            .unwrap_or(Self::DEFAULT_MAX_LINE_LENGTH)
    }

    fn diff_cut(&self) -> Option<&DiffCutDefaults> {
        self.file.diff_cut.as_ref()
    }

    /// Hash algorithm for repository hashes. Defaults to SHA-256.
    pub fn hash_type(&self) -> HashType {
        self.file
            .hash
            .as_ref()
            .and_then(|h| h.hash_type.as_deref())
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Aggregation for repository hashes. Defaults to XOR.
    pub fn aggregation(&self) -> AggregationType {
        self.file
            .hash
            .as_ref()
            .and_then(|h| h.aggregation.as_deref())
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Page size for listing commands when none is given.
    pub fn default_page_size(&self) -> usize {
        self.file
            .walk
            .as_ref()
            .and_then(|w| w.default_page_size)
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = Config::default();
        assert_eq!(config.git_binary(), "git");
        assert_eq!(config.diff_cut_before_lines(), 2);
        assert_eq!(config.diff_cut_after_lines(), 2);
        assert_eq!(config.diff_cut_line_limit(), 40);
        assert_eq!(config.max_line_length(), 200);
        assert_eq!(config.hash_type(), HashType::Sha256);
        assert_eq!(config.aggregation(), AggregationType::Xor);
        assert!(config.source_path().is_none());
    }

    #[test]
    fn load_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "git_binary = \"/bin/git\"\n[diff_cut]\nafter_lines = 5\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.git_binary(), "/bin/git");
        assert_eq!(config.diff_cut_after_lines(), 5);
        assert_eq!(config.diff_cut_before_lines(), 2);
        assert_eq!(config.source_path(), Some(path.as_path()));
    }

    #[test]
    fn load_missing_explicit_path_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn load_invalid_toml_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "git_binary = [").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
