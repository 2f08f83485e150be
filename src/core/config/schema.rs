//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing: numeric limits must be usable and
//! the hash settings must name a supported algorithm.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Engine configuration file.
///
/// # Example
///
/// ```toml
/// git_binary = "/usr/bin/git"
/// scratch_dir = "/var/tmp/gitweave"
///
/// [diff_cut]
/// before_lines = 2
/// after_lines = 2
/// line_limit = 40
/// max_line_length = 200
///
/// [hash]
/// hash_type = "sha256"
/// aggregation = "xor"
///
/// [walk]
/// default_page_size = 50
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Git binary to run (default: `git` from `PATH`)
    pub git_binary: Option<String>,

    /// Parent directory for scratch repositories (default: system temp dir)
    pub scratch_dir: Option<String>,

    /// Diff cut defaults
    pub diff_cut: Option<DiffCutDefaults>,

    /// Repository hash defaults
    pub hash: Option<HashDefaults>,

    /// Reference walk defaults
    pub walk: Option<WalkDefaults>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(binary) = &self.git_binary {
            if binary.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "git_binary cannot be empty".into(),
                ));
            }
        }
        if let Some(diff_cut) = &self.diff_cut {
            diff_cut.validate()?;
        }
        if let Some(hash) = &self.hash {
            hash.validate()?;
        }
        if let Some(walk) = &self.walk {
            if walk.default_page_size == Some(0) {
                return Err(ConfigError::InvalidValue(
                    "walk.default_page_size must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Context and size defaults applied to diff cuts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DiffCutDefaults {
    pub before_lines: Option<usize>,
    pub after_lines: Option<usize>,
    pub line_limit: Option<usize>,
    pub max_line_length: Option<usize>,
}

impl DiffCutDefaults {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.line_limit == Some(0) {
            return Err(ConfigError::InvalidValue(
                "diff_cut.line_limit must be positive".into(),
            ));
        }
        if self.max_line_length == Some(0) {
            return Err(ConfigError::InvalidValue(
                "diff_cut.max_line_length must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Repository hash defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HashDefaults {
    pub hash_type: Option<String>,
    pub aggregation: Option<String>,
}

impl HashDefaults {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hash_type) = &self.hash_type {
            hash_type
                .parse::<crate::hash::HashType>()
                .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        }
        if let Some(aggregation) = &self.aggregation {
            aggregation
                .parse::<crate::hash::AggregationType>()
                .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        }
        Ok(())
    }
}

/// Reference walk defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WalkDefaults {
    pub default_page_size: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_example() {
        let toml = r#"
            git_binary = "/usr/bin/git"

            [diff_cut]
            before_lines = 3
            line_limit = 10

            [hash]
            hash_type = "sha256"
            aggregation = "xor"
        "#;
        let config: FileConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.git_binary.as_deref(), Some("/usr/bin/git"));
        assert_eq!(config.diff_cut.as_ref().unwrap().before_lines, Some(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("bogus = 1");
        assert!(result.is_err());
    }

    #[test]
    fn zero_line_limit_invalid() {
        let config = FileConfig {
            diff_cut: Some(DiffCutDefaults {
                line_limit: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn unknown_hash_type_invalid() {
        let config = FileConfig {
            hash: Some(HashDefaults {
                hash_type: Some("md5".into()),
                aggregation: None,
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
