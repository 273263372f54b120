use crate::cli::output::OutputFormat;
use crate::descriptor::ModuleFlags;
use crate::platform::SupportedPlatform;
use crate::search::SearchOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Native module discovery and autolinking resolver
#[derive(Parser, Debug)]
#[command(
    name = "modlink",
    about = "Native module discovery and autolinking resolver",
    version,
    author,
    long_about = "modlink walks the dependency tree of a host project, finds packages that \
                  declare a native module configuration, deduplicates multiple installs of \
                  the same module, and emits platform-specific descriptors for build-system \
                  code generators (Gradle, CocoaPods, DevTools)."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Increase verbosity (debug-level diagnostics)"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Resolve modules declared by project dependencies",
        long_about = "Searches the given paths for packages declaring a module configuration, \
                      deduplicates multiple installs of the same logical module, and prints \
                      the resolved set.\n\n\
                      Examples:\n  \
                      modlink resolve node_modules --platform android\n  \
                      modlink resolve node_modules modules --platform ios --json\n  \
                      modlink resolve node_modules --platform devtools --exclude 'internal-*'"
    )]
    Resolve(ResolveArgs),

    #[command(
        about = "Generate platform descriptors for resolved modules",
        long_about = "Resolves modules like `resolve`, then projects each one into the \
                      requested platform's descriptor shape consumed by code generators.\n\n\
                      Examples:\n  \
                      modlink generate node_modules --platform ios\n  \
                      modlink generate node_modules --platform ios --flag useFrameworks='\"static\"'"
    )]
    Generate(GenerateArgs),
}

/// Search options shared by every subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    #[arg(
        value_name = "SEARCH_PATH",
        required = true,
        help = "Directories to scan for candidate packages"
    )]
    pub search_paths: Vec<PathBuf>,

    #[arg(short = 'p', long, value_enum, help = "Platform to resolve modules for")]
    pub platform: SupportedPlatform,

    #[arg(
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Root of the host project (its package manifest drives dependency filtering)"
    )]
    pub project_root: PathBuf,

    #[arg(
        long = "ignore-path",
        value_name = "GLOB",
        help = "Package paths to reject (repeatable)"
    )]
    pub ignore_paths: Vec<String>,

    #[arg(
        long,
        value_name = "GLOB",
        help = "Logical module names to reject (repeatable)"
    )]
    pub exclude: Vec<String>,

    #[arg(long, help = "Suppress per-package diagnostics")]
    pub silent: bool,

    #[arg(
        long,
        help = "Link every discovered module, not only project dependencies (monorepos)"
    )]
    pub no_project_deps: bool,

    #[arg(
        long = "flag",
        value_name = "KEY=JSON",
        value_parser = parse_flag,
        help = "Opaque flag forwarded into descriptors (repeatable)"
    )]
    pub flags: Vec<(String, serde_json::Value)>,
}

impl SearchArgs {
    pub fn to_options(&self) -> SearchOptions {
        let mut flags = ModuleFlags::new();
        for (key, value) in &self.flags {
            flags.insert(key.clone(), value.clone());
        }
        SearchOptions {
            search_paths: self.search_paths.clone(),
            ignore_paths: self.ignore_paths.clone(),
            exclude: self.exclude.clone(),
            platform: self.platform,
            silent: self.silent,
            project_root: self.project_root.clone(),
            only_project_deps: !self.no_project_deps,
            flags,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormat,

    #[arg(long, conflicts_with = "format", help = "Shorthand for --format json")]
    pub json: bool,
}

impl ResolveArgs {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "json",
        help = "Output format"
    )]
    pub format: OutputFormat,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

/// Parses `KEY=JSON` flag values; a bare `KEY=value` that is not valid JSON
/// is kept as a string.
fn parse_flag(input: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{input}'"))?;
    if key.is_empty() {
        return Err(format!("empty flag name in '{input}'"));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolve_command() {
        let args = CliArgs::parse_from([
            "modlink",
            "resolve",
            "node_modules",
            "--platform",
            "android",
            "--json",
        ]);
        let Commands::Resolve(resolve) = args.command else {
            panic!("expected resolve command");
        };
        assert_eq!(resolve.search.platform, SupportedPlatform::Android);
        assert_eq!(resolve.output_format(), OutputFormat::Json);
        let options = resolve.search.to_options();
        assert!(options.only_project_deps);
    }

    #[test]
    fn test_parse_flag_values() {
        let (key, value) = parse_flag("useFrameworks=\"static\"").unwrap();
        assert_eq!(key, "useFrameworks");
        assert_eq!(value, serde_json::json!("static"));

        let (_, value) = parse_flag("level=3").unwrap();
        assert_eq!(value, serde_json::json!(3));

        let (_, value) = parse_flag("label=plain text").unwrap();
        assert_eq!(value, serde_json::json!("plain text"));

        assert!(parse_flag("no-equals").is_err());
    }

    #[test]
    fn test_no_project_deps_inverts_default() {
        let args = CliArgs::parse_from([
            "modlink",
            "generate",
            "node_modules",
            "--platform",
            "ios",
            "--no-project-deps",
        ]);
        let Commands::Generate(generate) = args.command else {
            panic!("expected generate command");
        };
        assert!(!generate.search.to_options().only_project_deps);
    }
}
