use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextToSpeechRequest {
    pub text: String,
    pub locate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextToSpeechAndInferRequest {
    pub text: String,
    #[serde(default = "default_locate")]
    pub locate: String,
    pub model_id: String,
}

fn default_locate() -> String {
    "en".to_string()
}
