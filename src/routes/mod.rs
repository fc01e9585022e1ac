// HTTP layer
// Thin axum handlers over the services; all work happens in crate::services

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::services::inference::VoiceConverter;
use crate::services::pipeline::TrainingPipeline;
use crate::services::toolkit::Toolkit;
use crate::services::tts::SpeechSynthesizer;
use crate::services::workers::WorkerPool;

mod files;
mod form;
mod inference_routes;
mod model_routes;
mod speech_routes;
mod training_routes;

#[cfg(test)]
mod tests;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tts: Arc<dyn SpeechSynthesizer>,
    pub workers: WorkerPool,
    pub pipeline: TrainingPipeline,
    pub converter: VoiceConverter,
}

impl AppState {
    pub fn new(config: AppConfig, toolkit: Arc<dyn Toolkit>, tts: Arc<dyn SpeechSynthesizer>) -> Self {
        let config = Arc::new(config);
        let workers = WorkerPool::new(config.server.workers);
        Self {
            pipeline: TrainingPipeline::new(config.clone(), toolkit.clone(), workers.clone()),
            converter: VoiceConverter::new(config.clone(), toolkit, workers.clone()),
            config,
            tts,
            workers,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let server = state.config.server.clone();

    let mut router = Router::new()
        .route("/text-to-speech/", post(speech_routes::text_to_speech))
        .route("/text-file-to-speech/", post(speech_routes::text_file_to_speech))
        .route("/text-to-speech-and-infer/", post(speech_routes::text_to_speech_and_infer))
        .route("/text-file-to-speech-and-infer/", post(speech_routes::text_file_to_speech_and_infer))
        .route("/infer-audio/", post(inference_routes::infer_audio))
        .route("/train-model/", post(training_routes::train_model))
        .route("/train-model-file-zip/", post(training_routes::train_model_file_zip))
        .route("/models", get(model_routes::list_models))
        .route("/models/{model_id}", delete(model_routes::delete_model))
        .route("/models/{model_id}/cleanup", delete(model_routes::cleanup_model))
        .route("/health", get(model_routes::health))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .with_state(state);

    if server.cors {
        info!("CORS enabled for all origins");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
}
