//! Output formatting for multiple formats
//!
//! Formatters for JSON (machine-readable, the stable contract for external
//! tooling), YAML, and human-readable text. Results go to stdout; all
//! diagnostics go through tracing on stderr.

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::descriptor::ModuleDescriptor;
use crate::registry::SearchResults;

/// Output format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Output formatter for resolved modules and descriptors.
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the resolved module set of a `resolve` run.
    pub fn format_results(&self, results: &SearchResults) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(results)
                .context("Failed to serialize search results to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(results)
                .context("Failed to serialize search results to YAML"),
            OutputFormat::Human => Ok(self.format_results_human(results)),
        }
    }

    /// Formats the descriptor list of a `generate` run.
    pub fn format_descriptors(&self, descriptors: &[ModuleDescriptor]) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(descriptors)
                .context("Failed to serialize descriptors to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(descriptors)
                .context("Failed to serialize descriptors to YAML"),
            OutputFormat::Human => Ok(self.format_descriptors_human(descriptors)),
        }
    }

    fn format_results_human(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return "No modules found.\n".to_string();
        }

        let mut output = format!("Found {} module(s):\n", results.len());
        for (name, revision) in results.iter() {
            output.push_str(&format!(
                "  {} ({}) at {}\n",
                name,
                revision.version,
                revision.path.display()
            ));
            for duplicate in &revision.duplicates {
                output.push_str(&format!(
                    "    duplicate: {} at {}\n",
                    duplicate.version,
                    duplicate.path.display()
                ));
            }
        }
        output
    }

    fn format_descriptors_human(&self, descriptors: &[ModuleDescriptor]) -> String {
        if descriptors.is_empty() {
            return "No descriptors generated.\n".to_string();
        }

        let mut output = format!("Generated {} descriptor(s):\n", descriptors.len());
        for descriptor in descriptors {
            match descriptor {
                ModuleDescriptor::Android(android) => {
                    output.push_str(&format!(
                        "  {} [android] {} project(s), {} plugin(s), {} module class(es)\n",
                        android.package_name,
                        android.projects.len(),
                        android.plugins.len(),
                        android.modules.len()
                    ));
                }
                ModuleDescriptor::Ios(ios) => {
                    let pods: Vec<&str> =
                        ios.pods.iter().map(|pod| pod.pod_name.as_str()).collect();
                    output.push_str(&format!(
                        "  {} [ios] pods: {}{}\n",
                        ios.package_name,
                        pods.join(", "),
                        if ios.debug_only { " (debug only)" } else { "" }
                    ));
                }
                ModuleDescriptor::DevTools(devtools) => {
                    output.push_str(&format!(
                        "  {} [devtools] webpage root: {}\n",
                        devtools.package_name, devtools.webpage_root
                    ));
                }
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ModuleDescriptorDevTools, ModuleIosPodspecInfo, ModuleDescriptorIos};

    fn sample_descriptors() -> Vec<ModuleDescriptor> {
        vec![
            ModuleDescriptor::Ios(ModuleDescriptorIos {
                package_name: "cam".to_string(),
                pods: vec![ModuleIosPodspecInfo {
                    pod_name: "Cam".to_string(),
                    podspec_dir: "/n/cam".to_string(),
                }],
                swift_module_names: vec!["Cam".to_string()],
                modules: vec!["CamModule".to_string()],
                app_delegate_subscribers: vec![],
                react_delegate_handlers: vec![],
                debug_only: true,
                include_test_specs_locally: false,
                flags: Default::default(),
            }),
            ModuleDescriptor::DevTools(ModuleDescriptorDevTools {
                package_name: "tools".to_string(),
                package_root: "/n/tools".to_string(),
                webpage_root: "/n/tools/dist".to_string(),
            }),
        ]
    }

    #[test]
    fn test_json_descriptors_are_untagged() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_descriptors(&sample_descriptors()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["packageName"], "cam");
        assert_eq!(parsed[0]["pods"][0]["podName"], "Cam");
        assert_eq!(parsed[1]["webpageRoot"], "/n/tools/dist");
        // No enum tag leaks into the generator-facing shape.
        assert!(parsed[0].get("Ios").is_none());
    }

    #[test]
    fn test_human_descriptors_mention_each_module() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_descriptors(&sample_descriptors()).unwrap();
        assert!(output.contains("cam [ios]"));
        assert!(output.contains("(debug only)"));
        assert!(output.contains("tools [devtools]"));
    }

    #[test]
    fn test_human_empty_results() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_results(&SearchResults::default()).unwrap();
        assert_eq!(output, "No modules found.\n");
    }
}
