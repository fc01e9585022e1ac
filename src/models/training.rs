use serde::{Deserialize, Serialize};

/// Metadata stored next to a trained model as `model.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub model_id: String,
    pub name: String,
    pub epochs: u32,
    pub f0_method: String,
    pub user_id: String,
    pub train_at: String,
    pub created_at: String,
    /// Newest generator checkpoint, relative to the service base directory
    pub model_path: String,
    /// Relative to the service base directory
    pub config_path: String,
    #[serde(default)]
    pub cluster_model_path: String,
}

/// Returned by both training endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainResponse {
    pub message: String,
    pub model_path: String,
    pub config_path: String,
    pub model_id_for_infer: String,
}

/// One entry of `GET /models`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model_id: String,
    /// Epoch of the newest `G_*.pth`, if any
    pub latest_epoch: Option<u64>,
    pub record: Option<ModelRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
