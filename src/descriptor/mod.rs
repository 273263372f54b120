//! Platform descriptors and the projection from resolved revisions
//!
//! A [`ModuleDescriptor`] is the flattened, generator-ready projection of
//! one resolved module for one platform. The three variants form a tagged
//! union matched exhaustively at the generator boundary; they serialize
//! untagged because each platform's generator only ever sees its own shape.

use crate::config::{DevToolsConfig, IosConfig, ModuleConfig};
use crate::platform::SupportedPlatform;
use crate::registry::{PackageRevision, SearchResults};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Opaque host-project flags forwarded untouched into descriptors.
pub type ModuleFlags = serde_json::Map<String, serde_json::Value>;

/// A Gradle plugin contributed by a module, declared verbatim in the
/// manifest and passed through verbatim to the Gradle generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidGradlePluginDescriptor {
    /// Gradle plugin ID.
    pub id: String,
    /// Artifact group.
    pub group: String,
    /// Relative path to the gradle plugin directory.
    pub source_dir: String,
}

/// One Gradle project integration point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleAndroidProjectInfo {
    pub name: String,
    pub source_dir: String,
}

/// One Gradle plugin integration point, with its source dir resolved
/// against the package root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleAndroidPluginInfo {
    pub id: String,
    pub source_dir: String,
}

/// One podspec integration point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleIosPodspecInfo {
    pub pod_name: String,
    pub podspec_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptorAndroid {
    pub package_name: String,
    pub projects: Vec<ModuleAndroidProjectInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub plugins: Vec<ModuleAndroidPluginInfo>,
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptorIos {
    pub package_name: String,
    pub pods: Vec<ModuleIosPodspecInfo>,
    pub swift_module_names: Vec<String>,
    pub modules: Vec<String>,
    pub app_delegate_subscribers: Vec<String>,
    pub react_delegate_handlers: Vec<String>,
    pub debug_only: bool,
    pub include_test_specs_locally: bool,
    #[serde(skip_serializing_if = "ModuleFlags::is_empty", default)]
    pub flags: ModuleFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptorDevTools {
    pub package_name: String,
    pub package_root: String,
    pub webpage_root: String,
}

/// Generator-ready projection of one resolved module for one platform.
/// Immutable after creation; consumed exactly once by a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleDescriptor {
    Android(ModuleDescriptorAndroid),
    Ios(ModuleDescriptorIos),
    DevTools(ModuleDescriptorDevTools),
}

impl ModuleDescriptor {
    pub fn package_name(&self) -> &str {
        match self {
            ModuleDescriptor::Android(descriptor) => &descriptor.package_name,
            ModuleDescriptor::Ios(descriptor) => &descriptor.package_name,
            ModuleDescriptor::DevTools(descriptor) => &descriptor.package_name,
        }
    }
}

/// A podspec paired with the swift module name of the same sub-target.
///
/// The pairing is built as one sequence of records and only split into the
/// descriptor's parallel `pods`/`swiftModuleNames` arrays at the end, so
/// `pods[i]` and `swiftModuleNames[i]` cannot drift apart when the declared
/// counts diverge.
struct PodTarget {
    pod: ModuleIosPodspecInfo,
    swift_module_name: String,
}

/// Projects a resolved revision into `platform`'s descriptor.
///
/// Returns `None` (skip) when the revision carries no config, the config has
/// no section for the requested platform, or a required field for that
/// platform is missing. A skip never removes the revision from the resolved
/// results; it only withholds the descriptor.
pub fn project(
    name: &str,
    revision: &PackageRevision,
    platform: SupportedPlatform,
    flags: &ModuleFlags,
) -> Option<ModuleDescriptor> {
    let config = revision.config.as_ref()?;

    match platform {
        SupportedPlatform::Android => project_android(name, revision, config),
        SupportedPlatform::Ios => project_ios(name, revision, config, flags),
        SupportedPlatform::Web | SupportedPlatform::Devtools => {
            project_devtools(name, revision, config)
        }
    }
}

/// Projects every resolved module for `platform`, in discovery order,
/// dropping the ones that skip.
pub fn generate_descriptors(
    results: &SearchResults,
    platform: SupportedPlatform,
    flags: &ModuleFlags,
) -> Vec<ModuleDescriptor> {
    results
        .iter()
        .filter_map(|(name, revision)| {
            let descriptor = project(name, revision, platform, flags);
            if descriptor.is_none() {
                debug!(module = name, %platform, "module has no descriptor for platform");
            }
            descriptor
        })
        .collect()
}

fn project_android(
    name: &str,
    revision: &PackageRevision,
    config: &ModuleConfig,
) -> Option<ModuleDescriptor> {
    let android = config.android.as_ref()?;

    let projects = if android.gradle_paths.is_empty() {
        // Convention: a module without declared gradle paths keeps its
        // Gradle project in the android/ subdirectory.
        vec![ModuleAndroidProjectInfo {
            name: name.to_string(),
            source_dir: join_package_path(&revision.path, "android"),
        }]
    } else {
        android
            .gradle_paths
            .iter()
            .enumerate()
            .map(|(index, gradle_path)| ModuleAndroidProjectInfo {
                name: android_project_name(name, gradle_path, index),
                source_dir: join_package_path(&revision.path, gradle_path),
            })
            .collect()
    };

    let plugins = android
        .gradle_plugins
        .iter()
        .map(|plugin| ModuleAndroidPluginInfo {
            id: plugin.id.clone(),
            source_dir: join_package_path(&revision.path, &plugin.source_dir),
        })
        .collect();

    Some(ModuleDescriptor::Android(ModuleDescriptorAndroid {
        package_name: name.to_string(),
        projects,
        plugins,
        modules: android.modules.clone(),
    }))
}

fn project_ios(
    name: &str,
    revision: &PackageRevision,
    config: &ModuleConfig,
    flags: &ModuleFlags,
) -> Option<ModuleDescriptor> {
    let ios = config.ios.as_ref()?;
    let targets = ios_pod_targets(name, revision, ios);

    let (pods, swift_module_names) = targets
        .into_iter()
        .map(|target| (target.pod, target.swift_module_name))
        .unzip();

    Some(ModuleDescriptor::Ios(ModuleDescriptorIos {
        package_name: name.to_string(),
        pods,
        swift_module_names,
        modules: ios.modules.clone(),
        app_delegate_subscribers: ios.app_delegate_subscribers.clone(),
        react_delegate_handlers: ios.react_delegate_handlers.clone(),
        debug_only: ios.debug_only,
        include_test_specs_locally: ios.include_test_specs_locally,
        flags: flags.clone(),
    }))
}

fn project_devtools(
    name: &str,
    revision: &PackageRevision,
    config: &ModuleConfig,
) -> Option<ModuleDescriptor> {
    let devtools: &DevToolsConfig = config.devtools.as_ref()?;
    // webpageRoot is required; a devtools section without it yields no
    // descriptor rather than a defaulted one.
    let webpage_root = devtools.webpage_root.as_ref()?;

    Some(ModuleDescriptor::DevTools(ModuleDescriptorDevTools {
        package_name: name.to_string(),
        package_root: revision.path.to_string_lossy().into_owned(),
        webpage_root: join_package_path(&revision.path, webpage_root),
    }))
}

fn ios_pod_targets(name: &str, revision: &PackageRevision, ios: &IosConfig) -> Vec<PodTarget> {
    if ios.podspec_paths.is_empty() {
        // Convention: one podspec named after the package at its root.
        let swift_module_name = ios
            .swift_module_names
            .first()
            .cloned()
            .unwrap_or_else(|| name.to_string());
        return vec![PodTarget {
            pod: ModuleIosPodspecInfo {
                pod_name: name.to_string(),
                podspec_dir: revision.path.to_string_lossy().into_owned(),
            },
            swift_module_name,
        }];
    }

    // A single declared swift module name is the package's one Swift
    // product and covers every pod; with several declared, the name at the
    // same index belongs to this pod and any unmatched pod falls back to
    // its own name for imports.
    let shared_name = match ios.swift_module_names.as_slice() {
        [only] => Some(only),
        _ => None,
    };

    ios.podspec_paths
        .iter()
        .enumerate()
        .map(|(index, podspec_path)| {
            let pod = podspec_info(&revision.path, podspec_path);
            let swift_module_name = ios
                .swift_module_names
                .get(index)
                .or(shared_name)
                .cloned()
                .unwrap_or_else(|| pod.pod_name.clone());
            PodTarget {
                pod,
                swift_module_name,
            }
        })
        .collect()
}

fn podspec_info(package_path: &Path, podspec_path: &str) -> ModuleIosPodspecInfo {
    let relative = Path::new(podspec_path);
    let pod_name = relative
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| podspec_path.to_string());
    let podspec_dir = match relative.parent() {
        Some(parent) if parent != Path::new("") => package_path.join(parent),
        _ => package_path.to_path_buf(),
    };
    ModuleIosPodspecInfo {
        pod_name,
        podspec_dir: podspec_dir.to_string_lossy().into_owned(),
    }
}

fn android_project_name(package_name: &str, gradle_path: &str, index: usize) -> String {
    if index == 0 {
        return package_name.to_string();
    }
    let stem = Path::new(gradle_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| index.to_string());
    format!("{package_name}${stem}")
}

fn join_package_path(package_path: &Path, relative: &str) -> String {
    package_path.join(relative).to_string_lossy().into_owned()
}
