//! Repository configuration, stored as TOML in `<repo>/config`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RepoError, RepoResult};

/// Top-level repository configuration.
///
/// Every section and field is optional on disk; missing values take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub core: CoreConfig,
    pub user: UserConfig,
    pub pack: PackConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Branch that `HEAD` points at in a fresh repository.
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
        }
    }
}

/// Identity used as author and committer of new commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    #[serde(default = "default_user_name")]
    pub name: String,
    #[serde(default = "default_user_email")]
    pub email: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: default_user_name(),
            email: default_user_email(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// zstd level for pack entries.
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
    /// Object-database priority of a writer's in-memory buffer. Must exceed
    /// the pack backend's priority.
    #[serde(default = "default_mempack_priority")]
    pub mempack_priority: i32,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            compression_level: default_compression_level(),
            mempack_priority: default_mempack_priority(),
        }
    }
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_user_name() -> String {
    "quay".to_string()
}

fn default_user_email() -> String {
    "quay@localhost".to_string()
}

fn default_compression_level() -> i32 {
    quay_pack::DEFAULT_COMPRESSION_LEVEL
}

fn default_mempack_priority() -> i32 {
    1000
}

impl RepositoryConfig {
    pub fn from_toml(s: &str) -> RepoResult<Self> {
        toml::from_str(s).map_err(|e| RepoError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> RepoResult<String> {
        toml::to_string_pretty(self).map_err(|e| RepoError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> RepoResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn save(&self, path: &Path) -> RepoResult<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = RepositoryConfig::from_toml("").unwrap();
        assert_eq!(config, RepositoryConfig::default());
        assert_eq!(config.core.default_branch, "main");
        assert_eq!(config.user.email, "quay@localhost");
        assert_eq!(config.pack.compression_level, 3);
        assert_eq!(config.pack.mempack_priority, 1000);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = RepositoryConfig::from_toml(
            r#"
            [user]
            name = "builder"

            [pack]
            compression_level = 9
            "#,
        )
        .unwrap();
        assert_eq!(config.user.name, "builder");
        assert_eq!(config.user.email, "quay@localhost");
        assert_eq!(config.pack.compression_level, 9);
        assert_eq!(config.pack.mempack_priority, 1000);
        assert_eq!(config.core.default_branch, "main");
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        let mut config = RepositoryConfig::default();
        config.core.default_branch = "trunk".into();
        config.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[core]"));
        assert!(text.contains("default_branch = \"trunk\""));
        assert_eq!(RepositoryConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = RepositoryConfig::from_toml("[pack]\ncompression_level = \"high\"").unwrap_err();
        assert!(matches!(err, RepoError::Config(_)));
    }
}
