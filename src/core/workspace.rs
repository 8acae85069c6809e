//! Workspace discovery and layout
//!
//! A workspace is any directory holding a `.riskreg/` folder with the
//! register document (`db.json`) and the workspace configuration
//! (`config.yaml`).

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::document::{Document, DocumentBackend, JsonFileBackend};

const WORKSPACE_DIR: &str = ".riskreg";
const DOCUMENT_FILE: &str = "db.json";
const CONFIG_FILE: &str = "config.yaml";

/// A discovered or freshly created workspace
#[derive(Debug)]
pub struct Workspace {
    /// Directory containing `.riskreg/`
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current = std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                tracing::debug!(root = %current.display(), "found workspace");
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a workspace at `path`, failing if one already exists.
    ///
    /// The document is seeded with the demo dataset unless `empty` is set.
    pub fn init(path: &Path, empty: bool) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if root.join(WORKSPACE_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }
        Self::create(root, empty)
    }

    /// Create a workspace, overwriting any existing configuration and document
    pub fn init_force(path: &Path, empty: bool) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create(root, empty)
    }

    fn create(root: PathBuf, empty: bool) -> Result<Self, WorkspaceError> {
        let workspace = Self { root };
        std::fs::create_dir_all(workspace.data_dir())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        std::fs::write(workspace.config_path(), Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        let doc = if empty {
            Document::default()
        } else {
            Document::demo()
        };
        JsonFileBackend::new(workspace.document_path())
            .save(&doc)
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        tracing::info!(root = %workspace.root.display(), empty, "initialized workspace");
        Ok(workspace)
    }

    fn default_config() -> &'static str {
        r#"# Risk register workspace configuration

# Author recorded on entries you write (overrides the global config)
# author: ""

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto

# Register document, relative to the workspace root (default: .riskreg/db.json)
# data_file: ""
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the `.riskreg/` directory
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir().join(CONFIG_FILE)
    }

    pub fn document_path(&self) -> PathBuf {
        self.data_dir().join(DOCUMENT_FILE)
    }
}

/// Errors that can occur while locating or creating a workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not a risk register workspace (searched from {searched_from:?}). Run 'riskreg init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let workspace = Workspace::init(tmp.path(), false).unwrap();

        assert!(workspace.data_dir().is_dir());
        assert!(workspace.config_path().exists());
        assert!(workspace.document_path().exists());

        let doc = JsonFileBackend::new(workspace.document_path()).load().unwrap();
        assert_eq!(doc.risks.len(), 5);
    }

    #[test]
    fn test_init_empty_document() {
        let tmp = tempdir().unwrap();
        let workspace = Workspace::init(tmp.path(), true).unwrap();

        let doc = JsonFileBackend::new(workspace.document_path()).load().unwrap();
        assert!(doc.risks.is_empty());
        assert!(doc.companies.is_empty());
    }

    #[test]
    fn test_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path(), false).unwrap();

        let err = Workspace::init(tmp.path(), false).unwrap_err();
        assert!(matches!(err, WorkspaceError::AlreadyExists(_)));

        Workspace::init_force(tmp.path(), true).unwrap();
    }

    #[test]
    fn test_discover_from_nested_dir() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path(), true).unwrap();

        let subdir = tmp.path().join("reports/2024");
        std::fs::create_dir_all(&subdir).unwrap();

        let found = Workspace::discover_from(&subdir).unwrap();
        assert_eq!(found.root(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_discover_fails_outside_workspace() {
        let tmp = tempdir().unwrap();
        let err = Workspace::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound { .. }));
    }
}
