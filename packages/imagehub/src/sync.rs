//! Reconciles candidate files against the assets of a source.
//!
//! A candidate lands at `images/<source><filepath><filename>`. Whether it
//! creates, updates or leaves an asset alone is decided by comparing content
//! digests only.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use crate::entity::stored_file::{self, Area};
use crate::error::ImageHubError;
use crate::files::FileLocation;
use crate::hub::ImageHub;
use crate::models::report::{PathConflict, SyncReport};
use crate::utils::filename::relative_to;

/// A stored file offered for synchronization, positioned relative to the
/// source root.
#[derive(Debug, Clone)]
pub struct SyncCandidate {
    pub filepath: String,
    pub filename: String,
    pub file: stored_file::Model,
}

impl SyncCandidate {
    /// Re-root `file` at `root`. `None` for directories and files outside `root`.
    pub fn from_file(file: stored_file::Model, root: &str) -> Option<Self> {
        if file.is_directory {
            return None;
        }
        let filepath = relative_to(&file.filepath, root)?;
        Some(Self {
            filepath,
            filename: file.filename.clone(),
            file,
        })
    }

    /// Target path inside the source.
    pub fn path(&self) -> String {
        format!("{}{}", self.filepath, self.filename)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}

impl ImageHub {
    /// Synchronize `candidates` into the source's `images` area.
    ///
    /// Path conflicts fail only the affected candidate and are listed in the
    /// report. With `delete_old`, assets of the source whose path is not among
    /// the candidates are removed.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn synchronize(
        &self,
        candidates: Vec<SyncCandidate>,
        source_id: i32,
        delete_old: bool,
    ) -> Result<SyncReport, ImageHubError> {
        let source = self.get_source(source_id).await?;

        let mut report = SyncReport::default();
        let mut offered = HashSet::with_capacity(candidates.len());

        for candidate in &candidates {
            let path = candidate.path();
            offered.insert(path.clone());

            match self.sync_candidate(candidate, source_id).await {
                Ok(SyncOutcome::Created) => report.created.push(path),
                Ok(SyncOutcome::Updated) => report.updated.push(path),
                Ok(SyncOutcome::Unchanged) => report.unchanged.push(path),
                Err(e) if e.is_per_item() => {
                    warn!(path = %path, error = %e, "Skipping candidate");
                    report.conflicts.push(PathConflict {
                        path,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if delete_old {
            report.deleted = self.prune_missing(source_id, &offered).await?;
        }
        if report.changed() > 0 {
            self.touch_source(source).await?;
        }

        info!(
            created = report.created.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            deleted = report.deleted.len(),
            conflicts = report.conflicts.len(),
            "Synchronized source {}",
            source_id
        );
        Ok(report)
    }

    async fn sync_candidate(
        &self,
        candidate: &SyncCandidate,
        source_id: i32,
    ) -> Result<SyncOutcome, ImageHubError> {
        let location = FileLocation::image(source_id, &candidate.filepath, &candidate.filename)?;

        let Some(existing) = self.files.get_file(&location).await? else {
            let file = self.files.link_file(&location, &candidate.file).await?;
            self.insert_asset(&file, source_id, None).await?;
            debug!(location = %location, "created");
            return Ok(SyncOutcome::Created);
        };

        let outcome = if existing.content_hash == candidate.file.content_hash {
            SyncOutcome::Unchanged
        } else {
            self.files.replace_with(&existing, &candidate.file).await?;
            debug!(location = %location, "updated");
            SyncOutcome::Updated
        };

        // A file placed without an asset row (e.g. by an interrupted run) is adopted.
        if self.asset_for_file(&existing).await?.is_none() {
            self.insert_asset(&existing, source_id, None).await?;
        }
        Ok(outcome)
    }

    async fn prune_missing(
        &self,
        source_id: i32,
        offered: &HashSet<String>,
    ) -> Result<Vec<String>, ImageHubError> {
        let mut deleted = Vec::new();
        for file in self.files.list_files(Area::Images, source_id, "/").await? {
            let path = file.path();
            if offered.contains(&path) {
                continue;
            }
            match self.asset_for_file(&file).await? {
                Some(asset) => self.purge_asset(&asset).await?,
                None => self.files.delete_file(&file).await?,
            }
            debug!(path = %path, "deleted");
            deleted.push(path);
        }
        Ok(deleted)
    }
}
