// Domain models module
// Request and response bodies shared by the routes and services

pub mod training;
pub mod tts;

pub use training::{MessageResponse, ModelRecord, ModelSummary, TrainResponse};
pub use tts::{TextToSpeechAndInferRequest, TextToSpeechRequest};
