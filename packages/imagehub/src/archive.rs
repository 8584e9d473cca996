use std::io::Read;

use tracing::warn;

use crate::config::ImportConfig;
use crate::error::ImageHubError;
use crate::utils::filename::{is_ignored_archive_path, normalize_filepath, split_dir_filename};

/// One entry of a fully read archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveEntry {
    Directory { filepath: String },
    File {
        filepath: String,
        filename: String,
        data: Vec<u8>,
    },
}

/// Read a ZIP archive completely into memory.
///
/// Nothing is written anywhere: a corrupt or oversized archive is rejected
/// with `InvalidArchive` before any caller-side mutation. Entries escaping the
/// archive root and tooling noise (`__MACOSX/`, dot files) are skipped.
pub fn extract_zip(data: &[u8], limits: &ImportConfig) -> Result<Vec<ArchiveEntry>, ImageHubError> {
    let cursor = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| ImageHubError::InvalidArchive(format!("Invalid ZIP archive: {e}")))?;

    let mut entries = Vec::with_capacity(archive.len());
    let mut total_decompressed: u64 = 0;

    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .map_err(|e| ImageHubError::InvalidArchive(format!("ZIP read error: {e}")))?;

        let name = match file.enclosed_name() {
            Some(path) => path.to_string_lossy().replace('\\', "/"),
            None => {
                warn!(entry = file.name(), "Skipping archive entry outside the archive root");
                continue;
            }
        };

        if is_ignored_archive_path(&name) {
            continue;
        }

        if file.is_dir() {
            let filepath = normalize_filepath(&name).map_err(|e| {
                ImageHubError::InvalidArchive(format!("Bad directory '{name}': {e}"))
            })?;
            entries.push(ArchiveEntry::Directory { filepath });
            continue;
        }

        let (filepath, filename) = split_dir_filename(&name)
            .map_err(|e| ImageHubError::InvalidArchive(format!("Bad entry '{name}': {e}")))?;

        let mut buf = Vec::new();
        file.take(limits.max_file_size + 1)
            .read_to_end(&mut buf)
            .map_err(|e| ImageHubError::InvalidArchive(format!("Failed to read '{name}': {e}")))?;

        if buf.len() as u64 > limits.max_file_size {
            return Err(ImageHubError::InvalidArchive(format!(
                "File '{name}' exceeds maximum decompressed size of {} bytes",
                limits.max_file_size
            )));
        }

        total_decompressed += buf.len() as u64;
        if total_decompressed > limits.max_total_size {
            return Err(ImageHubError::InvalidArchive(format!(
                "Total decompressed archive content exceeds {} bytes",
                limits.max_total_size
            )));
        }

        entries.push(ArchiveEntry::File {
            filepath,
            filename,
            data: buf,
        });
    }

    Ok(entries)
}
