use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::errors::{AppError, AppResult};

/// Sampling-rate folder the toolkit uses for 44.1 kHz models
pub const RATE_DIR: &str = "44k";
pub const METADATA_FILE: &str = "model.json";

/// `<name>_<epochs>_<first 8 chars of a uuid v4>`
pub fn new_model_id(name: &str, epochs: u32) -> String {
    let suid = Uuid::new_v4().to_string();
    format!("{}_{}_{}", name, epochs, &suid[..8])
}

/// Accepts a single, non-empty path component. Model ids and speaker names
/// end up in filesystem paths, so separators and dot entries are rejected.
pub fn validate_component(value: &str, field: &str) -> AppResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{} must not be empty", field)));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(AppError::bad_request(format!("{} must not be '{}'", field, trimmed)));
    }
    if trimmed.chars().any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control()) {
        return Err(AppError::bad_request(format!(
            "{} must not contain path separators: '{}'",
            field, value
        )));
    }
    Ok(())
}

/// The directories the toolkit expects inside one model directory.
#[derive(Debug, Clone)]
pub struct ModelLayout {
    pub model_id: String,
    root: PathBuf,
    upload_dir: PathBuf,
}

impl ModelLayout {
    pub fn new(storage: &StorageConfig, model_id: &str) -> AppResult<Self> {
        validate_component(model_id, "model_id")?;
        let model_id = model_id.trim().to_string();
        Ok(Self {
            root: storage.train_model_dir().join(&model_id),
            upload_dir: storage.audio_data_dir().join(&model_id),
            model_id,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Raw training uploads for this model (`audio_data/<id>`)
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn dataset_raw(&self) -> PathBuf {
        self.root.join("dataset_raw")
    }

    /// Split output for one speaker
    pub fn speaker_dir(&self, speaker: &str) -> PathBuf {
        self.dataset_raw().join(speaker)
    }

    pub fn dataset_dir(&self) -> PathBuf {
        self.root.join("dataset").join(RATE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("configs").join(RATE_DIR).join("config.json")
    }

    pub fn filelist_dir(&self) -> PathBuf {
        self.root.join("filelists").join(RATE_DIR)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("logs").join(RATE_DIR)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    /// Everything only needed while training
    pub fn intermediate_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.dataset_raw(),
            self.root.join("dataset"),
            self.root.join("filelists"),
            self.upload_dir.clone(),
        ]
    }
}
