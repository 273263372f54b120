//! Module search pipeline
//!
//! Drives discovery from root search paths to resolved [`SearchResults`]:
//! enumerate candidate package roots (delegated), reject excluded paths and
//! names before any config read, filter to the project dependency closure,
//! normalize each surviving manifest, and register everything with the
//! revision registry.
//!
//! Independent search paths are traversed concurrently; registration is
//! serialized in the driver so duplicate detection always sees a consistent
//! view. Per-package failures are isolated — one bad manifest never aborts
//! the search. Only structural input errors (no search paths, unusable
//! project root) are fatal.

pub mod dependencies;
pub mod enumerator;

pub use dependencies::{AllDependencies, NodeModulesResolver, ProjectDependencies};
pub use enumerator::{FsPackageEnumerator, PackageCandidate, PackageEnumerator};

use crate::config::{ConfigError, ModuleConfig, RawModuleConfig, MODULE_CONFIG_FILENAME};
use crate::descriptor::ModuleFlags;
use crate::platform::SupportedPlatform;
use crate::registry::{PackageRevision, RevisionRegistry, SearchResults};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Options for one search run.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Directories to scan for candidate packages. Must be non-empty.
    pub search_paths: Vec<PathBuf>,

    /// Glob patterns for package paths to reject before reading any config.
    pub ignore_paths: Vec<String>,

    /// Glob patterns for logical module names to reject.
    pub exclude: Vec<String>,

    pub platform: SupportedPlatform,

    /// Suppress per-package diagnostics.
    pub silent: bool,

    /// Root of the host project, used for dependency-membership filtering.
    pub project_root: PathBuf,

    /// Restrict results to the project's transitive dependency closure.
    pub only_project_deps: bool,

    /// Opaque host-project flags, forwarded unmodified into descriptors.
    pub flags: ModuleFlags,
}

impl SearchOptions {
    pub fn new(project_root: impl Into<PathBuf>, platform: SupportedPlatform) -> Self {
        Self {
            search_paths: Vec::new(),
            ignore_paths: Vec::new(),
            exclude: Vec::new(),
            platform,
            silent: false,
            project_root: project_root.into(),
            only_project_deps: true,
            flags: ModuleFlags::new(),
        }
    }
}

/// Fatal, whole-operation failures. Everything per-package is downgraded to
/// a diagnostic instead.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no search paths given; at least one directory to scan is required")]
    EmptySearchPaths,

    #[error("project root not found: {0}")]
    ProjectRootNotFound(PathBuf),

    #[error("project root is not a directory: {0}")]
    ProjectRootNotADirectory(PathBuf),

    #[error("failed to load project manifest at {path}: {message}")]
    ProjectManifest { path: PathBuf, message: String },
}

/// Searches with the default collaborators: filesystem enumeration and
/// node_modules dependency resolution rooted at the project.
pub async fn search(options: &SearchOptions) -> Result<SearchResults, SearchError> {
    validate(options)?;
    let dependencies: Arc<dyn ProjectDependencies> =
        match NodeModulesResolver::load(&options.project_root).await {
            Ok(resolver) => Arc::new(resolver),
            Err(error) if !options.only_project_deps => {
                // Without closure filtering the project root is not required
                // to be a package itself (monorepo roots often are not);
                // every discovered module links, first-discovered wins.
                debug!(
                    error = %error,
                    "project manifest unavailable, linking all discovered modules"
                );
                Arc::new(AllDependencies)
            }
            Err(error) => return Err(error),
        };
    search_with(options, Arc::new(FsPackageEnumerator), dependencies).await
}

/// Searches with explicit collaborators.
pub async fn search_with(
    options: &SearchOptions,
    enumerator: Arc<dyn PackageEnumerator>,
    dependencies: Arc<dyn ProjectDependencies>,
) -> Result<SearchResults, SearchError> {
    validate(options)?;

    let filter = Arc::new(ExclusionFilter::new(
        &options.ignore_paths,
        &options.exclude,
        options.silent,
    ));

    // Traversal and file reads fan out per search path; nothing shared is
    // mutated until the results come back.
    let mut handles = Vec::with_capacity(options.search_paths.len());
    for search_path in &options.search_paths {
        let task = ScanTask {
            search_path: search_path.clone(),
            platform: options.platform,
            silent: options.silent,
            only_project_deps: options.only_project_deps,
            enumerator: Arc::clone(&enumerator),
            dependencies: Arc::clone(&dependencies),
            filter: Arc::clone(&filter),
        };
        handles.push(tokio::spawn(task.run()));
    }

    // Registration is the single-writer step: results are merged in search
    // path order, so canonical selection is deterministic regardless of how
    // the traversal tasks interleave.
    let mut registry = RevisionRegistry::new(options.silent);
    for handle in handles {
        match handle.await {
            Ok(discovered) => {
                for package in discovered {
                    registry.register(&package.name, package.revision, package.direct);
                }
            }
            Err(join_error) => {
                if !options.silent {
                    warn!(error = %join_error, "search path traversal task failed");
                }
            }
        }
    }

    let results = registry.resolve();
    info!(
        platform = %options.platform,
        modules = results.len(),
        "module search finished"
    );
    Ok(results)
}

fn validate(options: &SearchOptions) -> Result<(), SearchError> {
    if options.search_paths.is_empty() {
        return Err(SearchError::EmptySearchPaths);
    }
    if !options.project_root.exists() {
        return Err(SearchError::ProjectRootNotFound(
            options.project_root.clone(),
        ));
    }
    if !options.project_root.is_dir() {
        return Err(SearchError::ProjectRootNotADirectory(
            options.project_root.clone(),
        ));
    }
    Ok(())
}

struct DiscoveredPackage {
    name: String,
    revision: PackageRevision,
    direct: bool,
}

struct ScanTask {
    search_path: PathBuf,
    platform: SupportedPlatform,
    silent: bool,
    only_project_deps: bool,
    enumerator: Arc<dyn PackageEnumerator>,
    dependencies: Arc<dyn ProjectDependencies>,
    filter: Arc<ExclusionFilter>,
}

impl ScanTask {
    async fn run(self) -> Vec<DiscoveredPackage> {
        let candidates = match self.enumerator.enumerate(&self.search_path).await {
            Ok(candidates) => candidates,
            Err(error) => {
                if !self.silent {
                    warn!(
                        search_path = %self.search_path.display(),
                        error = %error,
                        "skipping unreadable search path"
                    );
                }
                return Vec::new();
            }
        };

        let mut discovered = Vec::new();
        for candidate in candidates {
            if self.filter.is_excluded(&candidate) {
                trace!(module = %candidate.name, "excluded by filter");
                continue;
            }
            if self.only_project_deps && !self.dependencies.contains(&candidate.name) {
                trace!(
                    module = %candidate.name,
                    "outside the project dependency closure"
                );
                continue;
            }

            let config = match load_module_config(&candidate.path, self.platform).await {
                Ok(Loaded::Config(config)) => config,
                Ok(Loaded::NoManifest) => {
                    // The package participates in discovery but declares no
                    // module integration; it contributes nothing.
                    continue;
                }
                Ok(Loaded::NotApplicable) => {
                    trace!(
                        module = %candidate.name,
                        platform = %self.platform,
                        "module does not support the requested platform"
                    );
                    continue;
                }
                Err(error) => {
                    if !self.silent {
                        warn!(module = %candidate.name, error = %error, "skipping module with malformed config");
                    }
                    continue;
                }
            };

            debug!(
                module = %candidate.name,
                version = %candidate.version,
                path = %candidate.path.display(),
                "discovered module"
            );
            discovered.push(DiscoveredPackage {
                direct: self
                    .dependencies
                    .is_project_revision(&candidate.name, &candidate.path),
                revision: PackageRevision::new(candidate.path, candidate.version)
                    .with_config(Some(config)),
                name: candidate.name,
            });
        }
        discovered
    }
}

enum Loaded {
    Config(ModuleConfig),
    NoManifest,
    NotApplicable,
}

async fn load_module_config(
    package_path: &Path,
    platform: SupportedPlatform,
) -> Result<Loaded, ConfigError> {
    let path = package_path.join(MODULE_CONFIG_FILENAME);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Loaded::NoManifest)
        }
        Err(error) => {
            return Err(ConfigError::Read {
                path,
                source: error,
            })
        }
    };
    let raw: RawModuleConfig = serde_json::from_str(&content).map_err(|error| {
        ConfigError::Parse {
            path,
            source: error,
        }
    })?;
    Ok(match ModuleConfig::normalize(raw, platform) {
        Some(config) => Loaded::Config(config),
        None => Loaded::NotApplicable,
    })
}

/// Cheap-rejection filter applied before any config read: glob patterns
/// over package paths (`ignorePaths`) and logical names (`exclude`).
struct ExclusionFilter {
    paths: Gitignore,
    names: Gitignore,
}

impl ExclusionFilter {
    fn new(ignore_paths: &[String], exclude: &[String], silent: bool) -> Self {
        Self {
            paths: build_matcher(Path::new("/"), ignore_paths, silent),
            names: build_matcher(Path::new(""), exclude, silent),
        }
    }

    fn is_excluded(&self, candidate: &PackageCandidate) -> bool {
        self.paths
            .matched_path_or_any_parents(&candidate.path, true)
            .is_ignore()
            || self
                .names
                .matched(Path::new(&candidate.name), true)
                .is_ignore()
    }
}

fn build_matcher(root: &Path, patterns: &[String], silent: bool) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
        if builder.add_line(None, pattern).is_err() && !silent {
            warn!(pattern = %pattern, "ignoring invalid exclusion pattern");
        }
    }
    builder.build().unwrap_or_else(|error| {
        if !silent {
            warn!(error = %error, "failed to build exclusion matcher, nothing will be excluded");
        }
        Gitignore::empty()
    })
}
