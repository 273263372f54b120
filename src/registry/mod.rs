//! Package revision accumulation and deduplication
//!
//! Monorepos and hoisted installs can expose the same logical module at
//! several physical locations, potentially at different versions. The
//! registry accumulates every discovered location keyed by logical module
//! name, selects exactly one canonical revision per name, and retains the
//! rest under the canonical entry's `duplicates` so callers can report
//! version skew. Nothing discovered is ever silently dropped.
//!
//! Canonical selection policy: a revision reachable from the project's own
//! dependency closure is preferred over one that is not; otherwise the
//! first-discovered revision wins. Both rules are deterministic given the
//! registry's single-writer registration order.

use crate::config::ModuleConfig;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// One physical on-disk location of a package.
///
/// `config` absent means the package exists but declares no module
/// integration for the requested platform; it yields no descriptor.
/// `duplicates` is populated only on the canonical entry and never contains
/// the entry's own path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRevision {
    pub path: PathBuf,
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ModuleConfig>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<PackageRevision>,
}

impl PackageRevision {
    pub fn new(path: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
            config: None,
            duplicates: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: Option<ModuleConfig>) -> Self {
        self.config = config;
        self
    }

    /// Secondary entries only need path and version; config and nested
    /// duplicates are stripped when a revision is demoted.
    fn into_duplicate(self) -> PackageRevision {
        PackageRevision {
            path: self.path,
            version: self.version,
            config: None,
            duplicates: Vec::new(),
        }
    }
}

/// Resolved search output: logical module name → canonical revision, in
/// discovery order. Every logical name appears at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    entries: Vec<(String, PackageRevision)>,
}

impl SearchResults {
    pub fn get(&self, name: &str) -> Option<&PackageRevision> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, revision)| revision)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PackageRevision)> {
        self.entries
            .iter()
            .map(|(name, revision)| (name.as_str(), revision))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SearchResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, revision) in &self.entries {
            map.serialize_entry(name, revision)?;
        }
        map.end()
    }
}

struct Entry {
    revision: PackageRevision,
    in_project_deps: bool,
}

/// Accumulates discovered packages and applies the canonical-selection
/// policy. The one shared mutable structure in the pipeline; callers
/// serialize registrations behind a single writer.
pub struct RevisionRegistry {
    order: Vec<String>,
    entries: HashMap<String, Entry>,
    silent: bool,
}

impl RevisionRegistry {
    pub fn new(silent: bool) -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
            silent,
        }
    }

    /// Registers one physical location of `name`.
    ///
    /// The first registration becomes canonical. A later registration at a
    /// different path either joins the canonical entry's `duplicates`, or
    /// preempts it when the newcomer is in the project's dependency closure
    /// and the incumbent is not. Re-registering an already-known path is a
    /// no-op.
    pub fn register(&mut self, name: &str, revision: PackageRevision, in_project_deps: bool) {
        let entry = match self.entries.entry(name.to_string()) {
            MapEntry::Vacant(slot) => {
                self.order.push(name.to_string());
                slot.insert(Entry {
                    revision,
                    in_project_deps,
                });
                return;
            }
            MapEntry::Occupied(slot) => slot.into_mut(),
        };

        let already_known = entry.revision.path == revision.path
            || entry
                .revision
                .duplicates
                .iter()
                .any(|duplicate| duplicate.path == revision.path);
        if already_known {
            return;
        }

        if !self.silent && revision.version != entry.revision.version {
            warn!(
                module = name,
                canonical_version = %entry.revision.version,
                duplicate_version = %revision.version,
                duplicate_path = %revision.path.display(),
                "found duplicate install of module with a different version"
            );
        }

        if in_project_deps && !entry.in_project_deps {
            // The project's own dependency tree is authoritative: promote the
            // newcomer and demote the incumbent into its duplicates.
            let mut demoted = std::mem::replace(&mut entry.revision, revision);
            let inherited = std::mem::take(&mut demoted.duplicates);
            entry.revision.duplicates.push(demoted.into_duplicate());
            entry.revision.duplicates.extend(inherited);
            entry.in_project_deps = true;
        } else {
            entry.revision.duplicates.push(revision.into_duplicate());
        }
    }

    /// Consumes the registry, yielding one canonical revision per logical
    /// name in discovery order.
    pub fn resolve(mut self) -> SearchResults {
        let entries = self
            .order
            .into_iter()
            .filter_map(|name| {
                self.entries
                    .remove(&name)
                    .map(|entry| (name, entry.revision))
            })
            .collect();
        SearchResults { entries }
    }
}
