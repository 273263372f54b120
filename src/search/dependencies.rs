//! Project dependency-closure membership
//!
//! Whether a candidate belongs to the project's dependency graph is a
//! delegated check: the pipeline asks "is this name in the transitive
//! closure" (the `onlyProjectDeps` filter) and "is this physical copy the
//! one the project's own dependency tree reaches" (the canonical-selection
//! preference — name membership alone cannot tell two installs of the same
//! module apart). The default implementation walks `package.json` manifests
//! through nested and hoisted node_modules trees; version range solving
//! stays upstream.

use super::enumerator::{read_package_manifest, PACKAGE_MANIFEST_FILENAME};
use super::SearchError;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Delegated dependency-membership collaborator.
pub trait ProjectDependencies: Send + Sync {
    /// True when `name` is reachable as a (possibly transitive) dependency
    /// of the project.
    fn contains(&self, name: &str) -> bool;

    /// True when the copy of `name` at `path` is the one resolved through
    /// the project's own direct dependency tree.
    fn is_project_revision(&self, name: &str, path: &Path) -> bool;
}

/// Membership check that treats every candidate as a project dependency and
/// no copy as preferred. Used when `onlyProjectDeps` is disabled.
#[derive(Debug, Default)]
pub struct AllDependencies;

impl ProjectDependencies for AllDependencies {
    fn contains(&self, _name: &str) -> bool {
        true
    }

    fn is_project_revision(&self, _name: &str, _path: &Path) -> bool {
        false
    }
}

/// Default resolver: BFS over `dependencies`/`devDependencies` starting at
/// the project manifest, locating each dependency through node-style
/// `node_modules` lookup from the dependent package upward.
#[derive(Debug)]
pub struct NodeModulesResolver {
    direct: HashSet<String>,
    closure: HashSet<String>,
    /// Resolved install location per package, canonicalized.
    locations: HashMap<String, PathBuf>,
}

impl NodeModulesResolver {
    /// Builds the closure for the project at `project_root`.
    ///
    /// An unreadable project manifest is fatal; a dependency whose own
    /// manifest cannot be found or parsed is logged and treated as a leaf.
    pub async fn load(project_root: &Path) -> Result<Self, SearchError> {
        let manifest = read_package_manifest(project_root)
            .await
            .map_err(|error| SearchError::ProjectManifest {
                path: project_root.join(PACKAGE_MANIFEST_FILENAME),
                message: error.to_string(),
            })?
            .ok_or_else(|| SearchError::ProjectManifest {
                path: project_root.join(PACKAGE_MANIFEST_FILENAME),
                message: "file not found".to_string(),
            })?;

        let mut direct: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, PathBuf)> = VecDeque::new();
        for name in manifest
            .dependencies
            .iter()
            .flat_map(|deps| deps.keys())
            .chain(
                manifest
                    .dev_dependencies
                    .iter()
                    .flat_map(|deps| deps.keys()),
            )
        {
            if direct.insert(name.clone()) {
                queue.push_back((name.clone(), project_root.to_path_buf()));
            }
        }

        let mut closure = direct.clone();
        let mut locations = HashMap::new();
        while let Some((name, base)) = queue.pop_front() {
            let Some(package_dir) = locate_package(&base, &name) else {
                trace!(package = %name, from = %base.display(), "dependency not installed, treating as leaf");
                continue;
            };
            locations.insert(name.clone(), canonical(&package_dir));

            let dependencies = match read_package_manifest(&package_dir).await {
                Ok(Some(manifest)) => manifest.dependencies.unwrap_or_default(),
                Ok(None) => continue,
                Err(error) => {
                    debug!(package = %name, error = %error, "unreadable dependency manifest, treating as leaf");
                    continue;
                }
            };
            // Transitive edges follow runtime dependencies only; dev
            // dependencies matter for the project itself alone.
            for dependency in dependencies.into_keys() {
                if closure.insert(dependency.clone()) {
                    queue.push_back((dependency, package_dir.clone()));
                }
            }
        }

        Ok(Self {
            direct,
            closure,
            locations,
        })
    }

    /// Direct dependencies of the project manifest itself.
    pub fn is_direct(&self, name: &str) -> bool {
        self.direct.contains(name)
    }

    pub fn len(&self) -> usize {
        self.closure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closure.is_empty()
    }
}

impl ProjectDependencies for NodeModulesResolver {
    fn contains(&self, name: &str) -> bool {
        self.closure.contains(name)
    }

    fn is_project_revision(&self, name: &str, path: &Path) -> bool {
        self.direct.contains(name)
            && self
                .locations
                .get(name)
                .is_some_and(|location| *location == canonical(path))
    }
}

/// Node-style resolution: check `<ancestor>/node_modules/<name>` from the
/// dependent package upward until the filesystem root.
fn locate_package(base: &Path, name: &str) -> Option<PathBuf> {
    for ancestor in base.ancestors() {
        let candidate = ancestor.join("node_modules").join(name);
        if candidate.join(PACKAGE_MANIFEST_FILENAME).is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Symlinked installs (pnpm, workspaces) make naive path equality lie.
fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, json: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(PACKAGE_MANIFEST_FILENAME), json).unwrap();
    }

    #[tokio::test]
    async fn test_direct_and_transitive_closure() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_manifest(root, r#"{ "name": "app", "dependencies": { "cam": "*" } }"#);
        write_manifest(
            &root.join("node_modules/cam"),
            r#"{ "name": "cam", "version": "1.0.0", "dependencies": { "cam-core": "*" } }"#,
        );
        write_manifest(
            &root.join("node_modules/cam-core"),
            r#"{ "name": "cam-core", "version": "1.0.0" }"#,
        );

        let resolver = NodeModulesResolver::load(root).await.unwrap();
        assert!(resolver.contains("cam"));
        assert!(resolver.contains("cam-core"));
        assert!(resolver.is_direct("cam"));
        assert!(!resolver.is_direct("cam-core"));
        assert!(!resolver.contains("unrelated"));
    }

    #[tokio::test]
    async fn test_project_revision_matches_resolved_install_only() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_manifest(root, r#"{ "name": "app", "dependencies": { "cam": "*" } }"#);
        write_manifest(
            &root.join("node_modules/cam"),
            r#"{ "name": "cam", "version": "2.0.0" }"#,
        );
        write_manifest(&root.join("vendor/cam"), r#"{ "name": "cam", "version": "1.0.0" }"#);

        let resolver = NodeModulesResolver::load(root).await.unwrap();
        assert!(resolver.is_project_revision("cam", &root.join("node_modules/cam")));
        assert!(!resolver.is_project_revision("cam", &root.join("vendor/cam")));
    }

    #[tokio::test]
    async fn test_dev_dependencies_are_direct() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_manifest(
            root,
            r#"{ "name": "app", "devDependencies": { "lint-kit": "*" } }"#,
        );
        write_manifest(
            &root.join("node_modules/lint-kit"),
            r#"{ "name": "lint-kit", "version": "1.0.0" }"#,
        );

        let resolver = NodeModulesResolver::load(root).await.unwrap();
        assert!(resolver.contains("lint-kit"));
        assert!(resolver.is_direct("lint-kit"));
    }

    #[tokio::test]
    async fn test_nested_install_resolves_through_dependent() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_manifest(root, r#"{ "name": "app", "dependencies": { "cam": "*" } }"#);
        write_manifest(
            &root.join("node_modules/cam"),
            r#"{ "name": "cam", "version": "2.0.0", "dependencies": { "cam-core": "*" } }"#,
        );
        // cam-core installed nested under cam, not hoisted.
        write_manifest(
            &root.join("node_modules/cam/node_modules/cam-core"),
            r#"{ "name": "cam-core", "version": "3.0.0" }"#,
        );

        let resolver = NodeModulesResolver::load(root).await.unwrap();
        assert!(resolver.contains("cam-core"));
    }

    #[tokio::test]
    async fn test_missing_project_manifest_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let result = NodeModulesResolver::load(tmp.path()).await;
        assert!(matches!(result, Err(SearchError::ProjectManifest { .. })));
    }

    #[tokio::test]
    async fn test_uninstalled_dependency_is_a_leaf() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_manifest(root, r#"{ "name": "app", "dependencies": { "ghost": "*" } }"#);

        let resolver = NodeModulesResolver::load(root).await.unwrap();
        assert!(resolver.contains("ghost"));
        assert_eq!(resolver.len(), 1);
    }
}
