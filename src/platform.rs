//! Target platforms supported by the autolinking pipeline
//!
//! A module manifest may restrict itself to a subset of these via its
//! `platforms` field; the resolver asks for exactly one platform per run.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A platform the resolver can produce descriptors for.
///
/// `Web` and `DevTools` share the DevTools descriptor shape; they stay
/// distinct here because manifests can declare them independently in their
/// `platforms` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SupportedPlatform {
    Ios,
    Android,
    Web,
    Devtools,
}

impl SupportedPlatform {
    /// All platforms, in the order commands list them.
    pub const ALL: [SupportedPlatform; 4] = [
        SupportedPlatform::Ios,
        SupportedPlatform::Android,
        SupportedPlatform::Web,
        SupportedPlatform::Devtools,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedPlatform::Ios => "ios",
            SupportedPlatform::Android => "android",
            SupportedPlatform::Web => "web",
            SupportedPlatform::Devtools => "devtools",
        }
    }
}

impl fmt::Display for SupportedPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
