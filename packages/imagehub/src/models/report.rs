use serde::Serialize;

/// A candidate that could not be placed because a file and a directory
/// claim the same path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathConflict {
    pub path: String,
    pub reason: String,
}

/// A manifest entry naming a file that does not exist next to the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedEntry {
    pub manifest: String,
    pub filename: String,
}

/// A manifest, or one entry of it, that could not be interpreted.
///
/// `index` is `None` when the manifest as a whole was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidEntry {
    pub manifest: String,
    pub index: Option<usize>,
    pub reason: String,
}

/// Outcome of a synchronization run. Paths are relative to the source root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub deleted: Vec<String>,
    pub conflicts: Vec<PathConflict>,
}

impl SyncReport {
    /// Number of files whose stored state changed.
    pub fn changed(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }

    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Outcome of manifest processing for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Manifests that were processed and removed.
    pub manifests: Vec<String>,
    /// Paths of assets that received metadata.
    pub applied: Vec<String>,
    pub unresolved: Vec<UnresolvedEntry>,
    pub invalid: Vec<InvalidEntry>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.invalid.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub sync: SyncReport,
    pub metadata: ApplyReport,
}

impl ImportResult {
    pub fn is_clean(&self) -> bool {
        self.sync.is_clean() && self.metadata.is_clean()
    }
}
