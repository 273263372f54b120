pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, GenerateArgs, ResolveArgs, SearchArgs};
pub use output::{OutputFormat, OutputFormatter};
