//! Candidate package enumeration
//!
//! Directory traversal is a delegated collaborator: the pipeline only needs
//! "list the candidate package roots under this search path". The default
//! implementation walks one level of a node_modules-style directory (two
//! levels for `@scope/*` packages) and identifies candidates by their
//! `package.json`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the package manifest identifying a candidate root.
pub const PACKAGE_MANIFEST_FILENAME: &str = "package.json";

const UNVERSIONED: &str = "UNVERSIONED";

/// The subset of `package.json` the resolver cares about.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub dev_dependencies: Option<BTreeMap<String, String>>,
}

/// Reads `dir/package.json`. A missing manifest is `None`; an unreadable or
/// malformed one is an error for the caller to classify.
pub(crate) async fn read_package_manifest(dir: &Path) -> Result<Option<PackageManifest>> {
    let path = dir.join(PACKAGE_MANIFEST_FILENAME);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(error).with_context(|| format!("failed to read {}", path.display()))
        }
    };
    let manifest = serde_json::from_str(&content)
        .with_context(|| format!("malformed package manifest at {}", path.display()))?;
    Ok(Some(manifest))
}

/// One candidate package root found under a search path.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageCandidate {
    /// Logical module name, as declared in the package manifest.
    pub name: String,
    pub version: String,
    pub path: PathBuf,
}

/// Delegated directory-traversal collaborator.
#[async_trait]
pub trait PackageEnumerator: Send + Sync {
    /// Lists candidate package roots under `search_path`, in a
    /// deterministic order.
    async fn enumerate(&self, search_path: &Path) -> Result<Vec<PackageCandidate>>;
}

/// Default enumerator over the real filesystem.
#[derive(Debug, Default)]
pub struct FsPackageEnumerator;

#[async_trait]
impl PackageEnumerator for FsPackageEnumerator {
    async fn enumerate(&self, search_path: &Path) -> Result<Vec<PackageCandidate>> {
        let mut candidates = Vec::new();
        for dir in list_directories(search_path).await? {
            let dir_name = dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if dir_name.starts_with('.') {
                continue;
            }
            if dir_name.starts_with('@') {
                // Scoped packages live one level deeper.
                for scoped in list_directories(&dir).await? {
                    if let Some(candidate) = candidate_at(&scoped).await? {
                        candidates.push(candidate);
                    }
                }
            } else if let Some(candidate) = candidate_at(&dir).await? {
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }
}

/// Lists subdirectories sorted by name, so discovery order (and with it the
/// first-discovered-wins tie-break) does not depend on readdir order.
async fn list_directories(path: &Path) -> Result<Vec<PathBuf>> {
    let mut reader = tokio::fs::read_dir(path)
        .await
        .with_context(|| format!("failed to list search path {}", path.display()))?;
    let mut directories = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .with_context(|| format!("failed to list search path {}", path.display()))?
    {
        let file_type = entry.file_type().await?;
        if file_type.is_dir() || file_type.is_symlink() {
            directories.push(entry.path());
        }
    }
    directories.sort();
    Ok(directories)
}

async fn candidate_at(dir: &Path) -> Result<Option<PackageCandidate>> {
    let manifest = match read_package_manifest(dir).await {
        Ok(Some(manifest)) => manifest,
        Ok(None) => return Ok(None),
        Err(error) => {
            // A broken package.json disqualifies the candidate but must not
            // abort enumeration of its siblings.
            debug!(path = %dir.display(), error = %error, "skipping unreadable package manifest");
            return Ok(None);
        }
    };
    let Some(name) = manifest.name else {
        return Ok(None);
    };
    Ok(Some(PackageCandidate {
        name,
        version: manifest.version.unwrap_or_else(|| UNVERSIONED.to_string()),
        path: dir.to_path_buf(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_package(root: &Path, dir: &str, name: &str, version: &str) {
        let package_dir = root.join(dir);
        fs::create_dir_all(&package_dir).unwrap();
        fs::write(
            package_dir.join(PACKAGE_MANIFEST_FILENAME),
            format!(r#"{{ "name": "{name}", "version": "{version}" }}"#),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_enumerates_plain_and_scoped_packages() {
        let tmp = TempDir::new().unwrap();
        write_package(tmp.path(), "cam", "cam", "1.0.0");
        write_package(tmp.path(), "@scope/gps", "@scope/gps", "2.1.0");
        fs::create_dir_all(tmp.path().join(".bin")).unwrap();

        let candidates = FsPackageEnumerator.enumerate(tmp.path()).await.unwrap();
        let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["@scope/gps", "cam"]);
        assert_eq!(candidates[0].version, "2.1.0");
    }

    #[tokio::test]
    async fn test_directory_without_manifest_is_not_a_candidate() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("not-a-package")).unwrap();
        write_package(tmp.path(), "cam", "cam", "1.0.0");

        let candidates = FsPackageEnumerator.enumerate(tmp.path()).await.unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_manifest_without_version_is_unversioned() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nameless");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(PACKAGE_MANIFEST_FILENAME), r#"{ "name": "nameless" }"#).unwrap();

        let candidates = FsPackageEnumerator.enumerate(tmp.path()).await.unwrap();
        assert_eq!(candidates[0].version, UNVERSIONED);
    }

    #[tokio::test]
    async fn test_missing_search_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("gone");
        assert!(FsPackageEnumerator.enumerate(&missing).await.is_err());
    }
}
