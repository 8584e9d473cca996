//! Import entry points: archives and directories into a source.

use tracing::{info, instrument, warn};

use crate::archive::{ArchiveEntry, extract_zip};
use crate::entity::stored_file::{self, Area};
use crate::error::ImageHubError;
use crate::files::{FileAttributes, FileLocation};
use crate::hub::ImageHub;
use crate::models::report::{ImportResult, PathConflict, SyncReport};
use crate::sync::SyncCandidate;

impl ImageHub {
    /// Extract a zip archive into the source's scratch area, synchronize it
    /// into the source and apply its manifests.
    ///
    /// The archive is parsed completely before anything is written, so an
    /// unreadable archive fails with `InvalidArchive` without side effects.
    /// The scratch area is emptied afterwards whatever the outcome.
    ///
    /// Manifests are consumed by the import and do not appear in the sync
    /// report; they are listed in `metadata.manifests`.
    #[instrument(skip(self, archive), fields(archive_size = archive.len()))]
    pub async fn import_archive(
        &self,
        archive: &[u8],
        source_id: i32,
        delete_old: bool,
    ) -> Result<ImportResult, ImageHubError> {
        let source = self.get_source(source_id).await?;
        if !source.source_type.accepts_archives() {
            warn!(
                "Importing an archive into {} source {}",
                source.source_type, source_id
            );
        }

        let entries = extract_zip(archive, &self.config)?;

        // Leftovers of an interrupted import.
        self.files.delete_area(Area::Scratch, source_id).await?;

        let result = self.import_entries(entries, source_id, delete_old).await;
        let cleanup = self.files.delete_area(Area::Scratch, source_id).await;

        match (result, cleanup) {
            (Ok(result), Ok(_)) => {
                info!(
                    created = result.sync.created.len(),
                    updated = result.sync.updated.len(),
                    conflicts = result.sync.conflicts.len(),
                    unresolved = result.metadata.unresolved.len(),
                    "Imported archive into source {}",
                    source_id
                );
                Ok(result)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), cleanup) => {
                if let Err(cleanup_err) = cleanup {
                    warn!(error = %cleanup_err, "Failed to clear scratch area of source {}", source_id);
                }
                Err(e)
            }
        }
    }

    async fn import_entries(
        &self,
        entries: Vec<ArchiveEntry>,
        source_id: i32,
        delete_old: bool,
    ) -> Result<ImportResult, ImageHubError> {
        let root = self
            .files
            .create_directory(Area::Scratch, source_id, "/")
            .await?;

        let mut extraction_conflicts = Vec::new();
        for entry in entries {
            let (path, written) = match entry {
                ArchiveEntry::Directory { filepath } => {
                    let written = self
                        .files
                        .create_directory(Area::Scratch, source_id, &filepath)
                        .await
                        .map(|_| ());
                    (filepath, written)
                }
                ArchiveEntry::File {
                    filepath,
                    filename,
                    data,
                } => {
                    let location = FileLocation::new(Area::Scratch, source_id, &filepath, &filename)?;
                    let written = self
                        .files
                        .put_file(&location, &data, FileAttributes::default())
                        .await
                        .map(|_| ());
                    (location.path(), written)
                }
            };

            match written {
                Ok(()) => {}
                Err(e) if e.is_per_item() => {
                    warn!(path = %path, error = %e, "Skipping archive entry");
                    extraction_conflicts.push(PathConflict {
                        path,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let mut sync = self.import_directory(&root, source_id, delete_old).await?;
        extraction_conflicts.append(&mut sync.conflicts);
        sync.conflicts = extraction_conflicts;

        let metadata = self.apply_manifest(source_id).await?;
        for paths in [&mut sync.created, &mut sync.updated, &mut sync.unchanged] {
            paths.retain(|path| !metadata.manifests.contains(path));
        }
        Ok(ImportResult { sync, metadata })
    }

    /// Synchronize every file below `directory` into the source, re-rooted
    /// so that `directory` maps to the source root.
    ///
    /// Manifests are not applied; call [`ImageHub::apply_manifest`] for that.
    #[instrument(skip(self, directory), fields(directory = %directory.logical_path()))]
    pub async fn import_directory(
        &self,
        directory: &stored_file::Model,
        source_id: i32,
        delete_old: bool,
    ) -> Result<SyncReport, ImageHubError> {
        self.get_source(source_id).await?;
        if !directory.is_directory {
            return Err(ImageHubError::NotADirectory(directory.logical_path()));
        }

        let candidates = self
            .files
            .list_files(directory.area, directory.item_id, &directory.filepath)
            .await?
            .into_iter()
            .filter_map(|file| SyncCandidate::from_file(file, &directory.filepath))
            .collect();

        self.synchronize(candidates, source_id, delete_old).await
    }
}
