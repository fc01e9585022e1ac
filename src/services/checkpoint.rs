use once_cell::sync::Lazy;
use path_clean::PathClean;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::AppResult;

// Generator checkpoints written by `svc train`: G_0.pth, G_800.pth, ...
// Имя целиком: G_800.pth.bak или G_800.pth.tmp чекпоинтами не считаются
static GENERATOR_CHECKPOINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^G_(\d+)\.pth$").expect("valid checkpoint pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub epoch: u64,
    pub path: PathBuf,
}

/// Parse the epoch out of a generator checkpoint file name.
pub fn checkpoint_epoch(file_name: &str) -> Option<u64> {
    GENERATOR_CHECKPOINT
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Newest `G_<epoch>.pth` in `log_dir`, by epoch number.
///
/// A missing directory is the same as an empty one.
pub fn latest_checkpoint(log_dir: &Path) -> AppResult<Option<Checkpoint>> {
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut latest: Option<Checkpoint> = None;
    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(epoch) = file_name.to_str().and_then(checkpoint_epoch) else {
            continue;
        };
        if latest.as_ref().map_or(true, |best| epoch > best.epoch) {
            latest = Some(Checkpoint {
                epoch,
                path: log_dir.join(&file_name),
            });
        }
    }

    Ok(latest)
}

/// Display form used in responses: forward slashes on every platform.
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// `path` relative to `base`, cleaned and with forward slashes.
/// Falls back to the cleaned full path when `path` is outside `base`.
pub fn relative_to_base(path: &Path, base: &Path) -> String {
    let path = path.to_path_buf().clean();
    let base = base.to_path_buf().clean();
    let relative = path.strip_prefix(&base).map(Path::to_path_buf).unwrap_or(path);
    to_forward_slashes(&relative)
}
