//! Trained models as they exist on disk under `trainmodel/`.

use log::{info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::checkpoint::latest_checkpoint;
use super::layout::ModelLayout;
use crate::config::StorageConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{ModelRecord, ModelSummary};

pub fn write_record(layout: &ModelLayout, record: &ModelRecord) -> AppResult<()> {
    let json = serde_json::to_string_pretty(record)?;
    fs::write(layout.metadata_path(), json)?;
    Ok(())
}

/// `model.json` of a model, `None` when it was never written.
pub fn read_record(layout: &ModelLayout) -> AppResult<Option<ModelRecord>> {
    let json = match fs::read_to_string(layout.metadata_path()) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&json)?))
}

/// Every model directory, sorted by id.
///
/// A broken `model.json` is logged and reported as a model without metadata.
pub fn list_models(storage: &StorageConfig) -> AppResult<Vec<ModelSummary>> {
    let entries = match fs::read_dir(storage.train_model_dir()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut models = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(model_id) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Ok(layout) = ModelLayout::new(storage, &model_id) else {
            continue;
        };

        let record = read_record(&layout).unwrap_or_else(|e| {
            warn!("Ignoring unreadable metadata of {}: {}", model_id, e);
            None
        });
        let latest_epoch = latest_checkpoint(&layout.log_dir())?.map(|c| c.epoch);
        models.push(ModelSummary {
            model_id,
            latest_epoch,
            record,
        });
    }

    models.sort_by(|a, b| a.model_id.cmp(&b.model_id));
    Ok(models)
}

fn existing_layout(storage: &StorageConfig, model_id: &str) -> AppResult<ModelLayout> {
    let layout = ModelLayout::new(storage, model_id)?;
    if !layout.exists() {
        return Err(AppError::NotFound(format!("Model '{}' not found", model_id)));
    }
    Ok(layout)
}

fn remove_dir_if_present(dir: &Path) -> AppResult<bool> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Remove a model directory together with its raw uploads.
pub fn delete_model(storage: &StorageConfig, model_id: &str) -> AppResult<()> {
    let layout = existing_layout(storage, model_id)?;
    fs::remove_dir_all(layout.root())?;
    remove_dir_if_present(layout.upload_dir())?;
    info!("Deleted model {}", layout.model_id);
    Ok(())
}

/// Drop everything only training needs, keeping configs, checkpoints and
/// metadata. Returns the directories that were actually removed.
pub fn cleanup_model(storage: &StorageConfig, model_id: &str) -> AppResult<Vec<PathBuf>> {
    let layout = existing_layout(storage, model_id)?;
    let mut removed = Vec::new();
    for dir in layout.intermediate_dirs() {
        if remove_dir_if_present(&dir)? {
            removed.push(dir);
        }
    }
    info!("Cleaned up {} ({} directories removed)", layout.model_id, removed.len());
    Ok(removed)
}
