use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::response::Response;
use axum::Json;
use log::info;
use std::path::PathBuf;

use super::files::audio_file_response;
use super::form::UploadForm;
use super::AppState;
use crate::errors::AppResult;
use crate::models::{TextToSpeechAndInferRequest, TextToSpeechRequest};
use crate::services::audio;
use crate::services::documents::{extract_text, DocumentKind};
use crate::services::tts::{validate_request, AudioFormat};
use crate::services::uploads::session_file;

/// Speak `text` into a fresh session file.
async fn synthesize(state: &AppState, text: &str, lang: &str) -> AppResult<PathBuf> {
    validate_request(text, lang)?;
    let files_dir = state.config.storage.files_dir();
    tokio::fs::create_dir_all(&files_dir).await?;

    let path = session_file(&files_dir, "", state.tts.output_format().extension());
    state.workers.run(state.tts.synthesize(text, lang, &path)).await?;
    audio::log_duration("Synthesized speech", &path);
    Ok(path)
}

/// Text of an uploaded `.txt`/`.docx`; the extension is checked before reading.
async fn uploaded_text(state: &AppState, form: &mut UploadForm) -> AppResult<String> {
    let upload = form.take_file()?;
    let kind = DocumentKind::from_file_name(upload.file_name())?;
    let bytes = upload.read_bytes().await?;
    info!("Reading {} ({} bytes)", upload.file_name(), bytes.len());
    state.workers.run_blocking(move || extract_text(kind, &bytes)).await
}

pub async fn text_to_speech(
    State(state): State<AppState>,
    payload: Result<Json<TextToSpeechRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload?;
    let path = synthesize(&state, &request.text, &request.locate).await?;
    audio_file_response(&path, state.tts.output_format()).await
}

pub async fn text_file_to_speech(State(state): State<AppState>, multipart: Multipart) -> AppResult<Response> {
    let mut form = UploadForm::read(multipart, &state.config.storage.files_dir()).await?;
    let text = uploaded_text(&state, &mut form).await?;
    let locate = form.text_or("locate", &state.config.tts.default_locale);

    let path = synthesize(&state, &text, locate).await?;
    audio_file_response(&path, state.tts.output_format()).await
}

pub async fn text_to_speech_and_infer(
    State(state): State<AppState>,
    payload: Result<Json<TextToSpeechAndInferRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload?;
    let model = state.converter.resolve(&request.model_id)?;

    let speech = synthesize(&state, &request.text, &request.locate).await?;
    let converted = state.converter.convert_file(&model, &speech).await?;
    audio_file_response(&converted, AudioFormat::Wav).await
}

pub async fn text_file_to_speech_and_infer(State(state): State<AppState>, multipart: Multipart) -> AppResult<Response> {
    let mut form = UploadForm::read(multipart, &state.config.storage.files_dir()).await?;
    let model = state.converter.resolve(form.text("model_id")?)?;
    let locate = form.text("locate")?.to_string();
    let text = uploaded_text(&state, &mut form).await?;

    let speech = synthesize(&state, &text, &locate).await?;
    let converted = state.converter.convert_file(&model, &speech).await?;
    audio_file_response(&converted, AudioFormat::Wav).await
}
