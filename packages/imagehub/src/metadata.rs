//! Applies `metadata.json` manifests found among a source's files.
//!
//! Entries are resolved against the manifest's own directory, so
//! `{"filename": "cats/a.png"}` in `/2024/metadata.json` targets
//! `/2024/cats/a.png`. Manifests are deleted once processed, including the
//! asset row synchronization created for them.

use tracing::{debug, info, instrument, warn};

use crate::entity::stored_file::{self, Area};
use crate::entity::asset;
use crate::error::ImageHubError;
use crate::files::FileLocation;
use crate::hub::ImageHub;
use crate::models::manifest::parse_manifest;
use crate::models::report::{ApplyReport, InvalidEntry, UnresolvedEntry};
use crate::utils::filename::split_dir_filename;

impl ImageHub {
    /// Process every manifest in the source's `images` area.
    ///
    /// Entries that cannot be matched or parsed are reported and skipped. A
    /// manifest is removed only after all of its entries were handled, so a
    /// fatal error halfway leaves it in place with earlier entries applied.
    #[instrument(skip(self))]
    pub async fn apply_manifest(&self, source_id: i32) -> Result<ApplyReport, ImageHubError> {
        self.get_source(source_id).await?;

        let manifests: Vec<_> = self
            .files
            .list_files(Area::Images, source_id, "/")
            .await?
            .into_iter()
            .filter(|f| f.filename == self.config.manifest_name)
            .collect();

        let mut report = ApplyReport::default();
        for manifest in &manifests {
            self.apply_manifest_file(manifest, &mut report).await?;
            self.discard_manifest(manifest).await?;
            report.manifests.push(manifest.path());
        }

        if !manifests.is_empty() {
            info!(
                manifests = report.manifests.len(),
                applied = report.applied.len(),
                unresolved = report.unresolved.len(),
                invalid = report.invalid.len(),
                "Applied manifests to source {}",
                source_id
            );
        }
        Ok(report)
    }

    async fn apply_manifest_file(
        &self,
        manifest: &stored_file::Model,
        report: &mut ApplyReport,
    ) -> Result<(), ImageHubError> {
        let label = manifest.path();
        let content = self.files.read_content(manifest).await?;

        let entries = match parse_manifest(&content) {
            Ok(entries) => entries,
            Err(reason) => {
                warn!(manifest = %label, "Rejected manifest: {}", reason);
                report.invalid.push(InvalidEntry {
                    manifest: label,
                    index: None,
                    reason,
                });
                return Ok(());
            }
        };

        for (index, entry) in entries.into_iter().enumerate() {
            let invalid = |reason: String| InvalidEntry {
                manifest: label.clone(),
                index: Some(index),
                reason,
            };

            let entry = match entry {
                Ok(entry) => entry,
                Err(reason) => {
                    warn!(manifest = %label, index, "Rejected entry: {}", reason);
                    report.invalid.push(invalid(reason));
                    continue;
                }
            };
            let (filename, patch) = entry.into_parts();
            let patch = match patch.validate() {
                Ok(patch) => patch,
                Err(reason) => {
                    warn!(manifest = %label, index, "Rejected entry: {}", reason);
                    report.invalid.push(invalid(reason));
                    continue;
                }
            };

            match self.resolve_entry(manifest, &filename).await? {
                Some((asset, path)) => {
                    self.apply_patch(asset, patch).await?;
                    debug!(manifest = %label, path = %path, "applied");
                    report.applied.push(path);
                }
                None => {
                    warn!(manifest = %label, filename = %filename, "No asset for entry");
                    report.unresolved.push(UnresolvedEntry {
                        manifest: label.clone(),
                        filename,
                    });
                }
            }
        }
        Ok(())
    }

    /// The asset named by `filename` relative to the manifest's directory.
    /// Manifests, this one or any other, never resolve.
    async fn resolve_entry(
        &self,
        manifest: &stored_file::Model,
        filename: &str,
    ) -> Result<Option<(asset::Model, String)>, ImageHubError> {
        let joined = format!("{}{}", manifest.filepath, filename.trim().trim_start_matches('/'));
        let Ok((filepath, name)) = split_dir_filename(&joined) else {
            return Ok(None);
        };
        if name == self.config.manifest_name {
            return Ok(None);
        }

        let location = FileLocation::image(manifest.item_id, &filepath, &name)?;
        let Some(file) = self.files.get_file(&location).await? else {
            return Ok(None);
        };
        let path = file.path();
        Ok(self.asset_for_file(&file).await?.map(|asset| (asset, path)))
    }

    async fn discard_manifest(&self, manifest: &stored_file::Model) -> Result<(), ImageHubError> {
        match self.asset_for_file(manifest).await? {
            Some(asset) => self.purge_asset(&asset).await,
            None => self.files.delete_file(manifest).await,
        }
    }
}
