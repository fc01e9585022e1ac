use axum::extract::{Multipart, State};
use axum::Json;

use super::form::UploadForm;
use super::AppState;
use crate::errors::AppResult;
use crate::models::TrainResponse;
use crate::services::pipeline::{DatasetMode, TrainingRequest};

async fn train(state: AppState, multipart: Multipart, mode: DatasetMode) -> AppResult<Json<TrainResponse>> {
    let mut form = UploadForm::read(multipart, &state.config.storage.files_dir()).await?;
    let request = TrainingRequest::parse(
        form.text("name")?,
        form.text("epochs_number")?,
        form.text("f0_method")?,
        form.text("user_id")?,
        form.text("trainAt")?,
    )?;
    let upload = form.take_file()?;

    // Обучение идёт часами: отдельная задача не отменяется, если клиент отвалился
    let pipeline = state.pipeline.clone();
    let response = tokio::spawn(async move { pipeline.run(request, upload, mode).await }).await??;
    Ok(Json(response))
}

pub async fn train_model(State(state): State<AppState>, multipart: Multipart) -> AppResult<Json<TrainResponse>> {
    train(state, multipart, DatasetMode::SplitRecording).await
}

pub async fn train_model_file_zip(State(state): State<AppState>, multipart: Multipart) -> AppResult<Json<TrainResponse>> {
    train(state, multipart, DatasetMode::ArchiveOrRecording).await
}
