use log::{debug, info, warn};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use walkdir::WalkDir;

use crate::errors::{AppError, AppResult};

/// Extract a dataset archive into `target_dir`.
///
/// Entries whose names would land outside `target_dir` reject the whole
/// archive. macOS resource forks are skipped. Returns the number of files written.
pub fn extract_zip(archive_path: &Path, target_dir: &Path) -> AppResult<usize> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| AppError::bad_request(format!("Not a valid zip archive: {}", e)))?;

    fs::create_dir_all(target_dir)?;

    let mut extracted = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(AppError::bad_request(format!(
                "Archive entry '{}' points outside the dataset directory",
                entry.name()
            )));
        };
        if relative.starts_with("__MACOSX") {
            debug!("Skipping {}", entry.name());
            continue;
        }

        let destination = target_dir.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&destination)?;
            continue;
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&destination)?;
        io::copy(&mut entry, &mut out)?;
        extracted += 1;
    }

    if extracted == 0 {
        warn!("Archive {} contained no files", archive_path.display());
    }
    info!("Extracted {} file(s) into {}", extracted, target_dir.display());
    Ok(extracted)
}

/// Regular files below `dir`, recursively
pub fn count_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .count()
}
