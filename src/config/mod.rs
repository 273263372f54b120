//! Module manifest parsing and normalization
//!
//! Every package that wants to participate in autolinking ships a
//! `module.config.json` next to its `package.json`. The raw shape is
//! loosely typed: optional sections per platform, deprecated field aliases,
//! and fields that accept either a scalar or an array. This module owns the
//! single normalization pass that turns that raw shape into an immutable,
//! fully-defaulted [`ModuleConfig`] for one requested platform.
//!
//! Alias precedence is an explicit rule: the canonical field (`modules`)
//! wins outright when present and non-empty, otherwise the deprecated alias
//! (`modulesClassNames`) is adopted, otherwise the field defaults to empty.
//! The same helper is applied to every aliased pair so the ordering cannot
//! drift between platforms.

use crate::descriptor::AndroidGradlePluginDescriptor;
use crate::platform::SupportedPlatform;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// File name of the module manifest read from each candidate package root.
pub const MODULE_CONFIG_FILENAME: &str = "module.config.json";

/// Errors raised while loading a single package's module manifest.
///
/// Both variants are per-package and recoverable: the search pipeline skips
/// the offending package and keeps going.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest exists but could not be read.
    #[error("failed to read module config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest content is not valid JSON or has the wrong shape.
    #[error("malformed module config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A field that accepts either a bare scalar or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Normalizes to a sequence, preserving declaration order.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// The as-declared manifest content. Untrusted and partially populated;
/// unknown fields are ignored so older tooling keeps working against newer
/// manifests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModuleConfig {
    /// Platforms this module supports. Absent means "no restriction".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<SupportedPlatform>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios: Option<RawIosConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android: Option<RawAndroidConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devtools: Option<RawDevToolsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIosConfig {
    /// Native module class names for the generated modules provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<String>>,

    /// Deprecated alias of `modules`; loses when both are declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules_class_names: Option<Vec<String>>,

    /// Classes hooking AppDelegate life-cycle events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_delegate_subscribers: Option<Vec<String>>,

    /// Classes hooking React instance creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub react_delegate_handlers: Option<Vec<String>>,

    /// Podspec path(s) relative to the package root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub podspec_path: Option<OneOrMany>,

    /// Swift product module name(s); the pod name is used when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift_module_name: Option<OneOrMany>,

    /// Link this module only into the debug configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_only: Option<bool>,

    /// Include podspec test specs when the package lives outside
    /// node_modules (local modules in custom search directories).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_test_specs_locally: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAndroidConfig {
    /// Full (package + class) names for the generated package provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<String>>,

    /// Deprecated alias of `modules`; loses when both are declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules_class_names: Option<Vec<String>>,

    /// build.gradle project path(s) relative to the package root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradle_path: Option<OneOrMany>,

    /// Gradle plugins contributed by this module, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradle_plugins: Option<Vec<AndroidGradlePluginDescriptor>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDevToolsConfig {
    /// Webpage root directory served by the DevTools host. Required for a
    /// DevTools descriptor; tolerated as absent at parse time so one bad
    /// section cannot fail the whole manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webpage_root: Option<String>,
}

/// Normalized iOS section: fully defaulted, aliases resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosConfig {
    pub modules: Vec<String>,
    pub app_delegate_subscribers: Vec<String>,
    pub react_delegate_handlers: Vec<String>,
    pub podspec_paths: Vec<String>,
    pub swift_module_names: Vec<String>,
    pub debug_only: bool,
    pub include_test_specs_locally: bool,
}

/// Normalized Android section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidConfig {
    pub modules: Vec<String>,
    pub gradle_paths: Vec<String>,
    pub gradle_plugins: Vec<AndroidGradlePluginDescriptor>,
}

/// Normalized DevTools section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevToolsConfig {
    pub webpage_root: Option<String>,
}

/// A normalized, immutable view over a raw manifest for one platform.
///
/// Only the section matching the requested platform is carried; the others
/// stay `None` so the descriptor projector can tell "no config for this
/// platform" apart from "empty config for this platform".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    pub platform: SupportedPlatform,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<SupportedPlatform>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios: Option<IosConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devtools: Option<DevToolsConfig>,
}

impl ModuleConfig {
    /// Normalizes a raw manifest for `platform`.
    ///
    /// Returns `None` when the manifest declares a `platforms` list that
    /// does not include the requested platform; such a package contributes
    /// nothing for that platform and must be excluded from descriptor
    /// generation rather than given empty fields. An absent `platforms`
    /// list places no restriction.
    ///
    /// Pure function of its inputs.
    pub fn normalize(raw: RawModuleConfig, platform: SupportedPlatform) -> Option<ModuleConfig> {
        if let Some(platforms) = &raw.platforms {
            if !platforms.contains(&platform) {
                return None;
            }
        }

        let mut config = ModuleConfig {
            platform,
            platforms: raw.platforms,
            ios: None,
            android: None,
            devtools: None,
        };

        match platform {
            SupportedPlatform::Ios => {
                config.ios = raw.ios.map(normalize_ios);
            }
            SupportedPlatform::Android => {
                config.android = raw.android.map(normalize_android);
            }
            // Web and DevTools share the devtools manifest section.
            SupportedPlatform::Web | SupportedPlatform::Devtools => {
                config.devtools = raw.devtools.map(|devtools| DevToolsConfig {
                    webpage_root: devtools.webpage_root,
                });
            }
        }

        Some(config)
    }

    /// Re-expresses this normalized view as a raw manifest.
    ///
    /// Normalizing the result for the same platform yields an identical
    /// `ModuleConfig` (normalization is idempotent).
    pub fn to_raw(&self) -> RawModuleConfig {
        RawModuleConfig {
            platforms: self.platforms.clone(),
            ios: self.ios.as_ref().map(|ios| RawIosConfig {
                modules: Some(ios.modules.clone()),
                modules_class_names: None,
                app_delegate_subscribers: Some(ios.app_delegate_subscribers.clone()),
                react_delegate_handlers: Some(ios.react_delegate_handlers.clone()),
                podspec_path: Some(OneOrMany::Many(ios.podspec_paths.clone())),
                swift_module_name: Some(OneOrMany::Many(ios.swift_module_names.clone())),
                debug_only: Some(ios.debug_only),
                include_test_specs_locally: Some(ios.include_test_specs_locally),
            }),
            android: self.android.as_ref().map(|android| RawAndroidConfig {
                modules: Some(android.modules.clone()),
                modules_class_names: None,
                gradle_path: Some(OneOrMany::Many(android.gradle_paths.clone())),
                gradle_plugins: Some(android.gradle_plugins.clone()),
            }),
            devtools: self.devtools.as_ref().map(|devtools| RawDevToolsConfig {
                webpage_root: devtools.webpage_root.clone(),
            }),
        }
    }
}

fn normalize_ios(raw: RawIosConfig) -> IosConfig {
    IosConfig {
        modules: resolve_alias(raw.modules, raw.modules_class_names),
        app_delegate_subscribers: raw.app_delegate_subscribers.unwrap_or_default(),
        react_delegate_handlers: raw.react_delegate_handlers.unwrap_or_default(),
        podspec_paths: raw.podspec_path.map(OneOrMany::into_vec).unwrap_or_default(),
        swift_module_names: raw
            .swift_module_name
            .map(OneOrMany::into_vec)
            .unwrap_or_default(),
        debug_only: raw.debug_only.unwrap_or(false),
        include_test_specs_locally: raw.include_test_specs_locally.unwrap_or(false),
    }
}

fn normalize_android(raw: RawAndroidConfig) -> AndroidConfig {
    AndroidConfig {
        modules: resolve_alias(raw.modules, raw.modules_class_names),
        gradle_paths: raw.gradle_path.map(OneOrMany::into_vec).unwrap_or_default(),
        gradle_plugins: raw.gradle_plugins.unwrap_or_default(),
    }
}

/// The ordered alias rule applied to every (canonical, deprecated) pair:
/// a present, non-empty canonical value wins outright; otherwise the
/// deprecated value is adopted; otherwise the field is empty.
fn resolve_alias(canonical: Option<Vec<String>>, deprecated: Option<Vec<String>>) -> Vec<String> {
    match canonical {
        Some(values) if !values.is_empty() => values,
        _ => deprecated.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: serde_json::Value) -> RawModuleConfig {
        serde_json::from_value(json).expect("valid raw config")
    }

    #[test]
    fn test_canonical_overrides_deprecated_alias() {
        let config = ModuleConfig::normalize(
            raw(serde_json::json!({
                "ios": { "modules": ["A"], "modulesClassNames": ["B"] }
            })),
            SupportedPlatform::Ios,
        )
        .expect("applicable");
        assert_eq!(config.ios.unwrap().modules, vec!["A"]);
    }

    #[test]
    fn test_deprecated_alias_adopted_when_canonical_absent() {
        let config = ModuleConfig::normalize(
            raw(serde_json::json!({
                "ios": { "modulesClassNames": ["Foo"] },
                "platforms": ["ios"]
            })),
            SupportedPlatform::Ios,
        )
        .expect("applicable");
        assert_eq!(config.ios.unwrap().modules, vec!["Foo"]);
    }

    #[test]
    fn test_deprecated_alias_adopted_when_canonical_empty() {
        let config = ModuleConfig::normalize(
            raw(serde_json::json!({
                "android": { "modules": [], "modulesClassNames": ["Pkg"] }
            })),
            SupportedPlatform::Android,
        )
        .expect("applicable");
        assert_eq!(config.android.unwrap().modules, vec!["Pkg"]);
    }

    #[test]
    fn test_platform_filtering_yields_not_applicable() {
        let result = ModuleConfig::normalize(
            raw(serde_json::json!({
                "ios": { "modulesClassNames": ["Foo"] },
                "platforms": ["ios"]
            })),
            SupportedPlatform::Android,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_absent_platforms_list_is_unrestricted() {
        let config = ModuleConfig::normalize(raw(serde_json::json!({})), SupportedPlatform::Android);
        assert!(config.is_some());
    }

    #[test]
    fn test_scalar_fields_normalize_to_single_element_sequences() {
        let config = ModuleConfig::normalize(
            raw(serde_json::json!({
                "ios": { "podspecPath": "My.podspec", "swiftModuleName": "My" }
            })),
            SupportedPlatform::Ios,
        )
        .expect("applicable");
        let ios = config.ios.unwrap();
        assert_eq!(ios.podspec_paths, vec!["My.podspec"]);
        assert_eq!(ios.swift_module_names, vec!["My"]);
    }

    #[test]
    fn test_array_fields_preserve_declaration_order() {
        let config = ModuleConfig::normalize(
            raw(serde_json::json!({
                "android": { "gradlePath": ["android", "android-extra"] }
            })),
            SupportedPlatform::Android,
        )
        .expect("applicable");
        assert_eq!(
            config.android.unwrap().gradle_paths,
            vec!["android", "android-extra"]
        );
    }

    #[test]
    fn test_boolean_flags_default_to_false() {
        let config = ModuleConfig::normalize(
            raw(serde_json::json!({ "ios": {} })),
            SupportedPlatform::Ios,
        )
        .expect("applicable");
        let ios = config.ios.unwrap();
        assert!(!ios.debug_only);
        assert!(!ios.include_test_specs_locally);
    }

    #[test]
    fn test_section_for_other_platform_stays_absent() {
        let config = ModuleConfig::normalize(
            raw(serde_json::json!({ "ios": { "modules": ["A"] } })),
            SupportedPlatform::Android,
        )
        .expect("applicable");
        assert!(config.android.is_none());
        assert!(config.ios.is_none());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let first = ModuleConfig::normalize(
            raw(serde_json::json!({
                "platforms": ["ios", "android"],
                "ios": {
                    "modulesClassNames": ["Legacy"],
                    "podspecPath": "A.podspec",
                    "debugOnly": true
                }
            })),
            SupportedPlatform::Ios,
        )
        .expect("applicable");

        let second =
            ModuleConfig::normalize(first.to_raw(), SupportedPlatform::Ios).expect("applicable");
        assert_eq!(first, second);
    }

    #[test]
    fn test_web_platform_reads_devtools_section() {
        let config = ModuleConfig::normalize(
            raw(serde_json::json!({ "devtools": { "webpageRoot": "dist" } })),
            SupportedPlatform::Web,
        )
        .expect("applicable");
        assert_eq!(
            config.devtools.unwrap().webpage_root.as_deref(),
            Some("dist")
        );
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let config: RawModuleConfig = serde_json::from_str(
            r#"{ "ios": { "modules": ["A"], "futureField": 42 }, "somethingElse": {} }"#,
        )
        .expect("tolerant parse");
        assert_eq!(config.ios.unwrap().modules.unwrap(), vec!["A"]);
    }
}
