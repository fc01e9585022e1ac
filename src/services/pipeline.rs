//! Training: upload -> dataset -> features -> checkpoints.

use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::archive;
use super::catalog;
use super::checkpoint::{latest_checkpoint, relative_to_base, to_forward_slashes};
use super::layout::{new_model_id, validate_component, ModelLayout};
use super::svc_config;
use super::toolkit::{ConfigParams, F0Method, FeatureParams, ResampleParams, SplitParams, Toolkit, TrainParams};
use super::uploads::SpooledUpload;
use super::workers::WorkerPool;
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{ModelRecord, TrainResponse};

pub const SUCCESS_MESSAGE: &str = "Audio processing completed successfully!";

/// How the uploaded file becomes `dataset_raw/`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetMode {
    /// One long recording, split on silence into `dataset_raw/<name>/`
    SplitRecording,
    /// A `.zip` of prepared speaker folders is extracted as is; anything else is split
    ArchiveOrRecording,
}

/// Validated form fields of a training request
#[derive(Debug, Clone)]
pub struct TrainingRequest {
    pub name: String,
    pub epochs: u32,
    pub f0_method: F0Method,
    pub user_id: String,
    pub train_at: String,
}

impl TrainingRequest {
    pub fn parse(name: &str, epochs_number: &str, f0_method: &str, user_id: &str, train_at: &str) -> AppResult<Self> {
        validate_component(name, "name")?;
        let epochs = parse_epochs(epochs_number)?;
        let f0_method = f0_method.parse::<F0Method>()?;
        Ok(Self {
            name: name.trim().to_string(),
            epochs,
            f0_method,
            user_id: user_id.to_string(),
            train_at: train_at.to_string(),
        })
    }
}

fn parse_epochs(value: &str) -> AppResult<u32> {
    match value.trim().parse::<u32>() {
        Ok(epochs) if epochs > 0 => Ok(epochs),
        _ => Err(AppError::bad_request(format!(
            "epochs_number must be a positive integer, got '{}'",
            value
        ))),
    }
}

#[derive(Clone)]
pub struct TrainingPipeline {
    config: Arc<AppConfig>,
    toolkit: Arc<dyn Toolkit>,
    workers: WorkerPool,
}

impl TrainingPipeline {
    pub fn new(config: Arc<AppConfig>, toolkit: Arc<dyn Toolkit>, workers: WorkerPool) -> Self {
        Self {
            config,
            toolkit,
            workers,
        }
    }

    /// Train a new model from one upload. The model directory is left in
    /// place on failure so the toolkit output can be inspected.
    pub async fn run(&self, request: TrainingRequest, upload: SpooledUpload, mode: DatasetMode) -> AppResult<TrainResponse> {
        let model_id = new_model_id(&request.name, request.epochs);
        let layout = ModelLayout::new(&self.config.storage, &model_id)?;
        info!(
            "Training {} (f0 {}, {} epochs, {} bytes uploaded)",
            model_id,
            request.f0_method,
            request.epochs,
            upload.size()
        );

        match self.train(&request, &layout, upload, mode).await {
            Ok(response) => {
                info!("Model {} is ready: {}", model_id, response.model_path);
                Ok(response)
            }
            Err(e) => {
                error!("Training {} failed: {}", model_id, e);
                Err(e)
            }
        }
    }

    async fn train(
        &self,
        request: &TrainingRequest,
        layout: &ModelLayout,
        upload: SpooledUpload,
        mode: DatasetMode,
    ) -> AppResult<TrainResponse> {
        let toolkit_config = &self.config.toolkit;
        let training = &self.config.training;

        fs::create_dir_all(layout.root())?;
        let is_archive = upload.file_name().to_ascii_lowercase().ends_with(".zip");
        let upload_path = layout.upload_dir().join(upload.file_name());
        let upload_path = upload.persist(&upload_path)?;
        info!("[1/6] Saved upload to {}", upload_path.display());

        if mode == DatasetMode::ArchiveOrRecording && is_archive {
            let target = layout.dataset_raw();
            let count = self
                .workers
                .run_blocking(move || archive::extract_zip(&upload_path, &target))
                .await?;
            info!("[2/6] Extracted {} file(s) into dataset_raw", count);
        } else {
            let speaker_dir = layout.speaker_dir(&request.name);
            fs::create_dir_all(&speaker_dir)?;
            let params = SplitParams::new(layout.upload_dir().to_path_buf(), speaker_dir, toolkit_config, training);
            self.workers.run(self.toolkit.split(&params)).await?;
            info!("[2/6] Split recording into {}", params.output_dir.display());
        }

        if archive::count_files(&layout.dataset_raw()) == 0 {
            return Err(AppError::bad_request("The upload contains no audio to train on"));
        }

        fs::create_dir_all(layout.dataset_dir())?;
        let params = ResampleParams::new(layout.dataset_raw(), layout.dataset_dir(), toolkit_config, training);
        self.workers.run(self.toolkit.resample(&params)).await?;
        info!("[3/6] Resampled dataset");

        let config_path = layout.config_path();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let params = ConfigParams {
            input_dir: layout.dataset_dir(),
            filelist_dir: layout.filelist_dir(),
            config_path: config_path.clone(),
            config_type: toolkit_config.config_type.clone(),
        };
        self.workers.run(self.toolkit.generate_config(&params)).await?;

        let defaults = training.clone();
        let epochs = request.epochs;
        let patch_path = config_path.clone();
        self.workers
            .run_blocking(move || svc_config::update_config(&patch_path, epochs, &defaults))
            .await?;
        info!("[4/6] Generated config {}", config_path.display());

        let params = FeatureParams {
            input_dir: layout.dataset_dir(),
            config_path: config_path.clone(),
            force_rebuild: true,
            f0_method: request.f0_method,
        };
        self.workers.run(self.toolkit.extract_features(&params)).await?;
        info!("[5/6] Extracted features ({})", request.f0_method);

        let params = TrainParams {
            config_path: config_path.clone(),
            model_path: layout.log_dir(),
            reset_optimizer: false,
        };
        self.workers.run(self.toolkit.train(&params)).await?;

        let checkpoint = latest_checkpoint(&layout.log_dir())?
            .ok_or_else(|| AppError::ToolkitError("training produced no checkpoint".to_string()))?;
        info!("[6/6] Trained up to epoch {}", checkpoint.epoch);

        let base_dir = &self.config.storage.base_dir;
        let record = ModelRecord {
            model_id: layout.model_id.clone(),
            name: request.name.clone(),
            epochs: request.epochs,
            f0_method: request.f0_method.to_string(),
            user_id: request.user_id.clone(),
            train_at: request.train_at.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            model_path: relative_to_base(&checkpoint.path, base_dir),
            config_path: relative_to_base(&config_path, base_dir),
            cluster_model_path: String::new(),
        };
        catalog::write_record(layout, &record)?;

        Ok(TrainResponse {
            message: SUCCESS_MESSAGE.to_string(),
            model_path: display_path(&checkpoint.path)?,
            config_path: display_path(&config_path)?,
            model_id_for_infer: layout.model_id.clone(),
        })
    }
}

// Абсолютный путь с прямыми слешами
fn display_path(path: &Path) -> AppResult<String> {
    let absolute: PathBuf = std::path::absolute(path)?;
    Ok(to_forward_slashes(&absolute))
}
