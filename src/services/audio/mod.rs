//! ffmpeg and WAV helpers around synthesized and converted audio.

use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command as TokioCommand;

use crate::errors::{AppError, AppResult};
use crate::utils::tools;

/// ffmpeg from the tool registry, falling back to a PATH lookup
pub fn ffmpeg_path() -> AppResult<PathBuf> {
    if let Some(path) = tools::get_tool_path("ffmpeg") {
        return Ok(path);
    }
    which::which("ffmpeg").map_err(|_| {
        AppError::AudioProcessingError("ffmpeg is not installed or not in PATH".to_string())
    })
}

/// Re-encode any input ffmpeg can read as 16-bit mono PCM WAV.
pub async fn transcode_to_wav(input: &Path, output: &Path, sample_rate: u32) -> AppResult<()> {
    let ffmpeg = ffmpeg_path()?;
    debug!("Transcoding {} -> {}", input.display(), output.display());

    let result = TokioCommand::new(&ffmpeg)
        .arg("-y") // Перезаписывать выходной файл
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input)
        .args(["-ar", &sample_rate.to_string()])
        .args(["-ac", "1"])
        .args(["-c:a", "pcm_s16le"])
        .arg(output)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| AppError::AudioProcessingError(format!("Failed to run ffmpeg: {}", e)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(AppError::AudioProcessingError(format!(
            "ffmpeg exited with {}: {}",
            result.status,
            stderr.trim()
        )));
    }

    Ok(())
}

/// Duration of a WAV file in seconds
pub fn wav_duration(path: &Path) -> AppResult<f32> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let frames = reader.duration();
    Ok(frames as f32 / spec.sample_rate as f32)
}

/// Log the length of a produced file; unreadable files are only noted.
pub fn log_duration(label: &str, path: &Path) {
    match wav_duration(path) {
        Ok(seconds) => info!("{}: {} ({:.2}s)", label, path.display(), seconds),
        Err(e) => debug!("{}: {} (duration unavailable: {})", label, path.display(), e),
    }
}
