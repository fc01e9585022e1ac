use axum::extract::{Multipart, State};
use axum::response::Response;

use super::files::audio_file_response;
use super::form::UploadForm;
use super::AppState;
use crate::errors::AppResult;
use crate::services::tts::AudioFormat;

pub async fn infer_audio(State(state): State<AppState>, multipart: Multipart) -> AppResult<Response> {
    let mut form = UploadForm::read(multipart, &state.config.storage.files_dir()).await?;
    let model_id = form.text("model_id")?.to_string();
    let upload = form.take_file()?;

    let converted = state.converter.convert_upload(&model_id, upload).await?;
    audio_file_response(&converted, AudioFormat::Wav).await
}
