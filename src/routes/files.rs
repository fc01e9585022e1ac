use axum::body::Body;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use std::path::Path;
use tokio_util::io::ReaderStream;

use crate::errors::AppResult;
use crate::services::tts::AudioFormat;

/// Stream an audio file back as an `output.<ext>` attachment.
pub async fn audio_file_response(path: &Path, format: AudioFormat) -> AppResult<Response> {
    let file = tokio::fs::File::open(path).await?;
    let length = file.metadata().await?.len();
    let body = Body::from_stream(ReaderStream::new(file));

    let disposition = format!("attachment; filename=\"output.{}\"", format.extension());
    Ok((
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (header::CONTENT_LENGTH, length.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
