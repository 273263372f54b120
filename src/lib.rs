//! modlink - native module discovery and autolinking resolver
//!
//! This library resolves, deduplicates, and describes native modules
//! contributed by the dependencies of a host project, across Android, iOS,
//! and Web/DevTools targets, so a build system can wire them into
//! platform-native registries without manual configuration.
//!
//! # Core Concepts
//!
//! - **Search Pipeline**: walks root search paths (delegating traversal and
//!   dependency-membership checks to collaborator traits), finds packages
//!   declaring a `module.config.json`, and feeds the registry
//! - **Revision Registry**: deduplicates multiple physical installs of the
//!   same logical module, selecting one canonical revision and retaining
//!   the rest for version-skew diagnostics
//! - **Descriptor Projector**: converts each resolved module into exactly
//!   one platform's generator-ready descriptor
//!
//! # Example Usage
//!
//! ```no_run
//! use modlink::{generate_descriptors, search, SearchOptions, SupportedPlatform};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut options = SearchOptions::new("/path/to/project", SupportedPlatform::Android);
//! options.search_paths.push("/path/to/project/node_modules".into());
//!
//! let results = search(&options).await?;
//! let descriptors = generate_descriptors(&results, options.platform, &options.flags);
//!
//! for descriptor in &descriptors {
//!     println!("linked: {}", descriptor.package_name());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`config`]: raw manifest model and the normalization pass
//! - [`registry`]: package revision deduplication
//! - [`search`]: the discovery pipeline and its collaborator traits
//! - [`descriptor`]: platform descriptors and projection

// Public modules
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod platform;
pub mod registry;
pub mod search;
pub mod util;

// Re-export key types for convenient access
pub use config::{ConfigError, ModuleConfig, RawModuleConfig};
pub use descriptor::{generate_descriptors, project, ModuleDescriptor, ModuleFlags};
pub use platform::SupportedPlatform;
pub use registry::{PackageRevision, SearchResults};
pub use search::{search, search_with, SearchError, SearchOptions};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
