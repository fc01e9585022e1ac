use serde::{Deserialize, Serialize};

/// How the so-vits-svc-fork command line is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// The `svc` entry point
    pub program: String,

    /// Prepended to every invocation, e.g. `["conda", "run", "-n", "svc"]`.
    /// When non-empty the first element is the executable and `program` becomes an argument.
    pub prefix_args: Vec<String>,

    /// Passed as `--device` to inference when set ("cuda", "cpu", ...)
    pub device: Option<String>,

    pub config_type: String,
    pub sampling_rate: u32,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            program: "svc".to_string(),
            prefix_args: Vec::new(),
            device: None,
            config_type: "so-vits-svc-4.0v1".to_string(),
            sampling_rate: 44100,
        }
    }
}

impl ToolkitConfig {
    /// The executable actually spawned
    pub fn launcher(&self) -> &str {
        self.prefix_args.first().map(String::as_str).unwrap_or(&self.program)
    }
}

/// Values written into the generated config plus the preprocessing knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingDefaults {
    pub batch_size: u32,
    pub log_interval: u32,
    pub eval_interval: u32,
    pub learning_rate: f64,

    pub split_max_length: f32,
    pub top_db: u32,
    pub frame_seconds: f32,
    pub hop_seconds: f32,
    /// -1 lets the toolkit use every core
    pub n_jobs: i32,
}

impl Default for TrainingDefaults {
    fn default() -> Self {
        Self {
            batch_size: 4,
            log_interval: 200,
            eval_interval: 400,
            learning_rate: 0.0001,
            split_max_length: 10.0,
            top_db: 30,
            frame_seconds: 1.0,
            hop_seconds: 0.3,
            n_jobs: -1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceDefaults {
    pub speaker: String,
    pub transpose: i32,
    pub auto_predict_f0: bool,
    pub cluster_infer_ratio: f32,
    pub noise_scale: f32,
    pub f0_method: String,
    pub db_thresh: i32,
    pub pad_seconds: f32,
    pub chunk_seconds: f32,
    pub absolute_thresh: bool,
    pub max_chunk_seconds: f32,
}

impl Default for InferenceDefaults {
    fn default() -> Self {
        Self {
            speaker: "0".to_string(),
            transpose: 0,
            auto_predict_f0: true,
            cluster_infer_ratio: 0.0,
            noise_scale: 0.4,
            f0_method: "dio".to_string(),
            db_thresh: -40,
            pad_seconds: 0.5,
            chunk_seconds: 0.5,
            absolute_thresh: false,
            max_chunk_seconds: 40.0,
        }
    }
}
