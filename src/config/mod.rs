// Configuration module
// Centralized management of service configuration

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};

pub mod toolkit; // so-vits-svc toolkit and its training/inference defaults
pub mod tts; // TTS configuration

pub use toolkit::{InferenceDefaults, ToolkitConfig, TrainingDefaults};
pub use tts::TtsConfig;

pub const ENV_CONFIG_PATH: &str = "VOICE_CHANGER_CONFIG";
const ENV_HOST: &str = "VOICE_CHANGER_HOST";
const ENV_PORT: &str = "VOICE_CHANGER_PORT";
const ENV_BASE_DIR: &str = "VOICE_CHANGER_BASE_DIR";
const ENV_SVC: &str = "VOICE_CHANGER_SVC";
const ENV_WORKERS: &str = "VOICE_CHANGER_WORKERS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allow any origin, method and header
    pub cors: bool,
    /// Request body limit for uploads, in bytes
    pub max_upload_bytes: usize,
    /// Slots in the worker pool wrapping toolkit and TTS calls
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors: true,
            max_upload_bytes: 512 * 1024 * 1024,
            workers: 20,
        }
    }
}

/// Where everything lands on disk. All other directories hang off `base_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub base_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
        }
    }
}

impl StorageConfig {
    /// Session files: synthesized speech, inference inputs and outputs
    pub fn files_dir(&self) -> PathBuf {
        self.base_dir.join("files")
    }

    /// Trained model directories
    pub fn train_model_dir(&self) -> PathBuf {
        self.base_dir.join("trainmodel")
    }

    /// Raw training uploads, one directory per model
    pub fn audio_data_dir(&self) -> PathBuf {
        self.base_dir.join("audio_data")
    }

    pub fn ensure_dirs(&self) -> AppResult<()> {
        for dir in [self.files_dir(), self.train_model_dir(), self.audio_data_dir()] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub toolkit: ToolkitConfig,
    pub tts: TtsConfig,
    pub training: TrainingDefaults,
    pub inference: InferenceDefaults,
}

impl AppConfig {
    /// Defaults, then the JSON file (if any), then environment overrides.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        info!("Loading config from {}", path.display());
        let json = fs::read_to_string(path).map_err(|e| {
            AppError::ConfigurationError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            AppError::ConfigurationError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn apply_env_overrides(&mut self) -> AppResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.parse().map_err(|_| {
                AppError::ConfigurationError(format!("{} must be a port number, got '{}'", ENV_PORT, port))
            })?;
        }
        if let Some(base_dir) = lookup(ENV_BASE_DIR) {
            self.storage.base_dir = PathBuf::from(base_dir);
        }
        if let Some(program) = lookup(ENV_SVC) {
            self.toolkit.program = program;
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            self.server.workers = workers.parse().map_err(|_| {
                AppError::ConfigurationError(format!("{} must be a number, got '{}'", ENV_WORKERS, workers))
            })?;
        }
        Ok(())
    }
}
