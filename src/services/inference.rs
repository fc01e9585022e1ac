use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::audio;
use super::checkpoint::latest_checkpoint;
use super::layout::ModelLayout;
use super::toolkit::{InferParams, Toolkit};
use super::uploads::{session_file, SpooledUpload};
use super::workers::WorkerPool;
use crate::config::{AppConfig, StorageConfig};
use crate::errors::{AppError, AppResult};

/// Checkpoint and config of a trained model, ready for `svc infer`
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub model_id: String,
    pub epoch: u64,
    pub model_path: PathBuf,
    pub config_path: PathBuf,
}

/// Find the newest generator checkpoint of `model_id`.
///
/// Both failure modes are client errors: the id names no model, or the
/// model has not produced a checkpoint yet.
pub fn resolve_model(storage: &StorageConfig, model_id: &str) -> AppResult<ResolvedModel> {
    let layout = ModelLayout::new(storage, model_id)?;
    if !layout.exists() {
        return Err(AppError::bad_request(format!(
            "Model directory not found at {}",
            layout.root().display()
        )));
    }

    let checkpoint = latest_checkpoint(&layout.log_dir())?
        .ok_or_else(|| AppError::bad_request("No G_*.pth model file found"))?;

    Ok(ResolvedModel {
        model_id: layout.model_id.clone(),
        epoch: checkpoint.epoch,
        model_path: checkpoint.path,
        config_path: layout.config_path(),
    })
}

/// Converts audio with a trained model into session files.
#[derive(Clone)]
pub struct VoiceConverter {
    config: Arc<AppConfig>,
    toolkit: Arc<dyn Toolkit>,
    workers: WorkerPool,
}

impl VoiceConverter {
    pub fn new(config: Arc<AppConfig>, toolkit: Arc<dyn Toolkit>, workers: WorkerPool) -> Self {
        Self {
            config,
            toolkit,
            workers,
        }
    }

    pub fn resolve(&self, model_id: &str) -> AppResult<ResolvedModel> {
        resolve_model(&self.config.storage, model_id)
    }

    /// Run `input` through `model`, writing `files/<uuid>_processed.wav`.
    pub async fn convert_file(&self, model: &ResolvedModel, input: &Path) -> AppResult<PathBuf> {
        let files_dir = self.config.storage.files_dir();
        fs::create_dir_all(&files_dir)?;
        let output = session_file(&files_dir, "_processed", "wav");

        let params = InferParams::from_defaults(
            &self.config.inference,
            input.to_path_buf(),
            output.clone(),
            model.model_path.clone(),
            model.config_path.clone(),
        )?;
        info!("Converting {} with {} (epoch {})", input.display(), model.model_id, model.epoch);
        self.workers.run(self.toolkit.infer(&params)).await?;

        if !output.is_file() {
            return Err(AppError::ToolkitError(format!(
                "svc infer did not write {}",
                output.display()
            )));
        }
        audio::log_duration("Converted audio", &output);
        Ok(output)
    }

    /// Save an uploaded recording as `files/<uuid>.wav` and convert it.
    /// The model is resolved before anything is written.
    pub async fn convert_upload(&self, model_id: &str, upload: SpooledUpload) -> AppResult<PathBuf> {
        let model = self.resolve(model_id)?;
        let input = session_file(&self.config.storage.files_dir(), "", "wav");
        let input = upload.persist(&input)?;
        self.convert_file(&model, &input).await
    }
}
