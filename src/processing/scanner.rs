//! Source tree discovery.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{ConverterError, Result};
use crate::processing::filter::FileFilter;

/// A file accepted by the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Full path, rooted at the scan root.
    pub path: PathBuf,
    /// Path relative to the scan root.
    pub relative_path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// Walk `root` and return the files the filter accepts.
///
/// Entries are visited in file-name order within each directory, so the
/// result is deterministic for a given tree.
///
/// Symlinks are not followed. Entries that cannot be read are logged and
/// skipped; only a missing or unreadable root is an error.
pub fn scan_directory(root: &Path, filter: &FileFilter) -> Result<Vec<ScannedFile>> {
    let metadata = std::fs::metadata(root).map_err(|e| ConverterError::io(root, e))?;
    if !metadata.is_dir() {
        return Err(ConverterError::Config(format!(
            "source path is not a directory: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    let mut skipped = 0usize;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let descend = entry
                .file_name()
                .to_str()
                .map(|name| filter.should_descend(name))
                .unwrap_or(false);
            let excluded = entry
                .path()
                .strip_prefix(root)
                .map(|relative| filter.is_excluded_path(relative))
                .unwrap_or(false);
            descend && !excluded
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                skipped += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "Skipping file without metadata"
                );
                skipped += 1;
                continue;
            }
        };

        let relative_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or_else(|_| entry.path())
            .to_path_buf();

        let relative_str = relative_path.to_string_lossy();
        if let Err(reason) = filter.should_process(&relative_str, size) {
            debug!(path = %relative_str, reason = %reason, "Filtered out");
            skipped += 1;
            continue;
        }

        files.push(ScannedFile {
            path: entry.path().to_path_buf(),
            relative_path,
            size,
        });
    }

    let bytes: u64 = files.iter().map(|f| f.size).sum();
    info!(
        root = %root.display(),
        files = files.len(),
        bytes,
        skipped,
        "Scan complete"
    );
    Ok(files)
}
