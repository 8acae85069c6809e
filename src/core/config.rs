//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::workspace::Workspace;

/// CLI configuration, merged from global file, workspace file and environment
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Author recorded on occurrences reported without a responsible
    pub author: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Register document; relative paths resolve against the workspace root
    pub data_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // Global user config (~/.config/riskreg/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // Workspace config (.riskreg/config.yaml)
        if let Some(workspace) = workspace {
            if let Some(mut local) = Self::read_file(&workspace.config_path()) {
                if let Some(ref data_file) = local.data_file {
                    if data_file.is_relative() {
                        local.data_file = Some(workspace.root().join(data_file));
                    }
                }
                config.merge(local);
            }
        }

        // Environment variables
        config.merge(Self::from_env());

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        let blank = contents
            .lines()
            .map(str::trim)
            .all(|line| line.is_empty() || line.starts_with('#'));
        if blank {
            return None;
        }
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    fn from_env() -> Config {
        Config {
            author: std::env::var("RISKREG_AUTHOR").ok().filter(|s| !s.is_empty()),
            default_format: None,
            data_file: std::env::var_os("RISKREG_DATA")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "riskreg")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.data_file.is_some() {
            self.data_file = other.data_file;
        }
    }

    /// Get the author name, falling back to the login name
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut config = Config {
            author: Some("global".to_string()),
            default_format: Some("json".to_string()),
            data_file: None,
        };
        config.merge(Config {
            author: Some("local".to_string()),
            default_format: None,
            data_file: Some(PathBuf::from("/tmp/db.json")),
        });

        assert_eq!(config.author.as_deref(), Some("local"));
        assert_eq!(config.default_format.as_deref(), Some("json"));
        assert_eq!(config.data_file, Some(PathBuf::from("/tmp/db.json")));
    }

    #[test]
    fn test_workspace_config_resolves_relative_data_file() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = Workspace::init(tmp.path(), true).unwrap();
        std::fs::write(
            workspace.config_path(),
            "author: Carlos\ndata_file: shared/register.json\n",
        )
        .unwrap();

        let local = Config::read_file(&workspace.config_path()).unwrap();
        assert_eq!(local.author.as_deref(), Some("Carlos"));

        let config = Config::load(Some(&workspace));
        if std::env::var_os("RISKREG_DATA").is_none() {
            assert_eq!(
                config.data_file,
                Some(workspace.root().join("shared/register.json"))
            );
        }
    }

    #[test]
    fn test_commented_template_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let workspace = Workspace::init(tmp.path(), true).unwrap();
        assert_eq!(Config::read_file(&workspace.config_path()), None);
    }
}
