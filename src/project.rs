//! Project root and name resolution

use std::path::{Path, PathBuf};

use serde::Deserialize;

use bdemon_core::prelude::*;

const PACKAGE_JSON: &str = "package.json";

/// The JavaScript project being served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub root: PathBuf,
    pub name: String,
}

impl ProjectInfo {
    /// Resolve from an optional CLI path, defaulting to the current directory
    pub fn resolve(path: Option<PathBuf>) -> Result<Self> {
        let root = resolve_project_root(path)?;
        let name = project_name(&root);
        Ok(Self { root, name })
    }
}

/// The project root: `path` if given, else the current directory.
///
/// Fails when the path is not a directory.
pub fn resolve_project_root(path: Option<PathBuf>) -> Result<PathBuf> {
    let root = match path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    if !root.is_dir() {
        return Err(Error::no_project(root));
    }
    Ok(root)
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    name: Option<String>,
}

/// Name from `package.json`, falling back to the directory name
pub fn project_name(root: &Path) -> String {
    if let Some(name) = manifest_name(root) {
        return name;
    }

    // `.` and friends have no file name until resolved
    let dir = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

fn manifest_name(root: &Path) -> Option<String> {
    let path = root.join(PACKAGE_JSON);
    let content = std::fs::read_to_string(&path).ok()?;

    match serde_json::from_str::<PackageManifest>(&content) {
        Ok(manifest) => manifest.name.filter(|n| !n.trim().is_empty()),
        Err(e) => {
            warn!("Failed to parse {:?}: {}", path, e);
            None
        }
    }
}
