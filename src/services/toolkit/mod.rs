//! so-vits-svc-fork, the toolkit that does the actual work.
//!
//! Each operation maps to one `svc` subcommand. The service only sequences
//! them and keeps track of where their inputs and outputs live.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{InferenceDefaults, ToolkitConfig, TrainingDefaults};
use crate::errors::{AppError, AppResult};

mod svc_cli;

pub use svc_cli::SvcCli;

/// Pitch extraction methods the toolkit understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum F0Method {
    Crepe,
    CrepeTiny,
    Parselmouth,
    Dio,
    Harvest,
}

impl F0Method {
    pub const ALL: [F0Method; 5] = [
        F0Method::Crepe,
        F0Method::CrepeTiny,
        F0Method::Parselmouth,
        F0Method::Dio,
        F0Method::Harvest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            F0Method::Crepe => "crepe",
            F0Method::CrepeTiny => "crepe-tiny",
            F0Method::Parselmouth => "parselmouth",
            F0Method::Dio => "dio",
            F0Method::Harvest => "harvest",
        }
    }
}

impl fmt::Display for F0Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for F0Method {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        F0Method::ALL
            .into_iter()
            .find(|method| method.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = F0Method::ALL.iter().map(|m| m.as_str()).collect();
                AppError::bad_request(format!(
                    "Unsupported f0_method '{}', expected one of: {}",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// `svc pre-split`: cut long recordings into clips on silence
#[derive(Debug, Clone, PartialEq)]
pub struct SplitParams {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub sr: u32,
    pub max_length: f32,
    pub top_db: u32,
    pub frame_seconds: f32,
    pub hop_seconds: f32,
    pub n_jobs: i32,
}

impl SplitParams {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf, toolkit: &ToolkitConfig, training: &TrainingDefaults) -> Self {
        Self {
            input_dir,
            output_dir,
            sr: toolkit.sampling_rate,
            max_length: training.split_max_length,
            top_db: training.top_db,
            frame_seconds: training.frame_seconds,
            hop_seconds: training.hop_seconds,
            n_jobs: training.n_jobs,
        }
    }
}

/// `svc pre-resample`
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleParams {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub sampling_rate: u32,
    pub top_db: u32,
    pub frame_seconds: f32,
    pub hop_seconds: f32,
    pub n_jobs: i32,
}

impl ResampleParams {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf, toolkit: &ToolkitConfig, training: &TrainingDefaults) -> Self {
        Self {
            input_dir,
            output_dir,
            sampling_rate: toolkit.sampling_rate,
            top_db: training.top_db,
            frame_seconds: training.frame_seconds,
            hop_seconds: training.hop_seconds,
            n_jobs: training.n_jobs,
        }
    }
}

/// `svc pre-config`: filelists plus `config.json` from a template
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigParams {
    pub input_dir: PathBuf,
    pub filelist_dir: PathBuf,
    pub config_path: PathBuf,
    pub config_type: String,
}

/// `svc pre-hubert`: content features and f0
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureParams {
    pub input_dir: PathBuf,
    pub config_path: PathBuf,
    pub force_rebuild: bool,
    pub f0_method: F0Method,
}

/// `svc train`
#[derive(Debug, Clone, PartialEq)]
pub struct TrainParams {
    pub config_path: PathBuf,
    pub model_path: PathBuf,
    pub reset_optimizer: bool,
}

/// `svc infer`
#[derive(Debug, Clone, PartialEq)]
pub struct InferParams {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub model_path: PathBuf,
    pub config_path: PathBuf,
    pub speaker: String,
    pub cluster_model_path: Option<PathBuf>,
    pub transpose: i32,
    pub auto_predict_f0: bool,
    pub cluster_infer_ratio: f32,
    pub noise_scale: f32,
    pub f0_method: F0Method,
    pub db_thresh: i32,
    pub pad_seconds: f32,
    pub chunk_seconds: f32,
    pub absolute_thresh: bool,
    pub max_chunk_seconds: f32,
}

impl InferParams {
    pub fn from_defaults(
        defaults: &InferenceDefaults,
        input_path: PathBuf,
        output_path: PathBuf,
        model_path: PathBuf,
        config_path: PathBuf,
    ) -> AppResult<Self> {
        let f0_method = defaults.f0_method.parse::<F0Method>().map_err(|_| {
            AppError::ConfigurationError(format!("inference.f0_method '{}' is not supported", defaults.f0_method))
        })?;
        Ok(Self {
            input_path,
            output_path,
            model_path,
            config_path,
            speaker: defaults.speaker.clone(),
            cluster_model_path: None,
            transpose: defaults.transpose,
            auto_predict_f0: defaults.auto_predict_f0,
            cluster_infer_ratio: defaults.cluster_infer_ratio,
            noise_scale: defaults.noise_scale,
            f0_method,
            db_thresh: defaults.db_thresh,
            pad_seconds: defaults.pad_seconds,
            chunk_seconds: defaults.chunk_seconds,
            absolute_thresh: defaults.absolute_thresh,
            max_chunk_seconds: defaults.max_chunk_seconds,
        })
    }
}

/// The voice-conversion toolkit as the service sees it.
#[async_trait]
pub trait Toolkit: Send + Sync {
    async fn split(&self, params: &SplitParams) -> AppResult<()>;

    async fn resample(&self, params: &ResampleParams) -> AppResult<()>;

    async fn generate_config(&self, params: &ConfigParams) -> AppResult<()>;

    async fn extract_features(&self, params: &FeatureParams) -> AppResult<()>;

    async fn train(&self, params: &TrainParams) -> AppResult<()>;

    async fn infer(&self, params: &InferParams) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f0_method_parsing() {
        assert_eq!("dio".parse::<F0Method>().unwrap(), F0Method::Dio);
        assert_eq!("Crepe-Tiny".parse::<F0Method>().unwrap(), F0Method::CrepeTiny);
        assert_eq!(" harvest ".parse::<F0Method>().unwrap(), F0Method::Harvest);

        let err = "pyin".parse::<F0Method>().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(err.to_string().contains("parselmouth"));
    }

    #[test]
    fn test_infer_params_from_defaults() {
        let params = InferParams::from_defaults(
            &InferenceDefaults::default(),
            "in.wav".into(),
            "out.wav".into(),
            "G_10.pth".into(),
            "config.json".into(),
        )
        .unwrap();
        assert_eq!(params.f0_method, F0Method::Dio);
        assert_eq!(params.speaker, "0");
        assert!(params.auto_predict_f0);
        assert_eq!(params.cluster_model_path, None);
        assert_eq!(params.max_chunk_seconds, 40.0);

        let broken = InferenceDefaults {
            f0_method: "yin".into(),
            ..InferenceDefaults::default()
        };
        assert!(InferParams::from_defaults(&broken, "a".into(), "b".into(), "c".into(), "d".into()).is_err());
    }
}
