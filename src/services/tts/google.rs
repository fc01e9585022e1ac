use async_trait::async_trait;
use log::{error, info, warn};
use reqwest::{header, Client, StatusCode};
use std::path::Path;
use std::time::Duration;

use super::{split_text, validate_request, AudioFormat, SpeechSynthesizer};
use crate::config::TtsConfig;
use crate::errors::{AppError, AppResult};
use crate::services::audio;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Google Translate TTS, the backend gTTS talks to.
pub struct GoogleTts {
    client: Client,
    config: TtsConfig,
}

impl GoogleTts {
    pub fn new(config: TtsConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::ConfigurationError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// MP3 bytes for one chunk, retrying on 429/5xx and network errors.
    async fn fetch_chunk(&self, chunk: &str, lang: &str, idx: usize, total: usize) -> AppResult<Vec<u8>> {
        let textlen = chunk.chars().count().to_string();
        let idx_str = idx.to_string();
        let total_str = total.to_string();
        let query = [
            ("ie", "UTF-8"),
            ("q", chunk),
            ("tl", lang),
            ("total", total_str.as_str()),
            ("idx", idx_str.as_str()),
            ("textlen", textlen.as_str()),
            ("client", "tw-ob"),
        ];

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let response = self
                .client
                .get(&self.config.endpoint)
                .header(header::REFERER, "https://translate.google.com/")
                .query(&query)
                .send()
                .await;

            let retry_reason = match response {
                Ok(resp) if resp.status().is_success() => {
                    let bytes = resp.bytes().await?;
                    if bytes.is_empty() {
                        return Err(AppError::TtsError(format!("Empty audio for chunk {}/{}", idx + 1, total)));
                    }
                    return Ok(bytes.to_vec());
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    error!("TTS request failed (status {}): {}", status, body.chars().take(200).collect::<String>());
                    if status != StatusCode::TOO_MANY_REQUESTS && !status.is_server_error() {
                        return Err(AppError::TtsError(format!(
                            "TTS service rejected chunk {}/{} with {}",
                            idx + 1,
                            total,
                            status
                        )));
                    }
                    format!("status {}", status)
                }
                Err(e) => {
                    error!("TTS request error: {}", e);
                    e.to_string()
                }
            };

            if attempts >= max_attempts {
                return Err(AppError::TtsError(format!(
                    "Giving up on chunk {}/{} after {} attempts: {}",
                    idx + 1,
                    total,
                    attempts,
                    retry_reason
                )));
            }

            let wait_time = Duration::from_millis(self.config.retry_base_ms.saturating_mul(2u64.pow(attempts)));
            warn!("Повтор запроса через {:.1} секунд...", wait_time.as_secs_f32());
            tokio::time::sleep(wait_time).await;
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    fn output_format(&self) -> AudioFormat {
        if self.config.transcode_to_wav {
            AudioFormat::Wav
        } else {
            AudioFormat::Mp3
        }
    }

    async fn synthesize(&self, text: &str, lang: &str, destination: &Path) -> AppResult<()> {
        validate_request(text, lang)?;
        let lang = lang.trim();

        let chunks = split_text(text, self.config.chunk_chars);
        info!("Synthesizing {} chars in '{}' as {} request(s)", text.chars().count(), lang, chunks.len());

        // MP3-кадры можно просто склеить, так же делает gTTS
        let mut mp3 = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            mp3.extend(self.fetch_chunk(chunk, lang, idx, chunks.len()).await?);
        }

        if !self.config.transcode_to_wav {
            tokio::fs::write(destination, &mp3).await?;
            return Ok(());
        }

        let staging = tempfile::Builder::new().suffix(".mp3").tempfile()?;
        tokio::fs::write(staging.path(), &mp3).await?;
        audio::transcode_to_wav(staging.path(), destination, self.config.sample_rate).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP server answering every request with the next canned status/body.
    async fn canned_server(responses: Vec<(u16, &'static [u8])>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 8192];
                let _ = socket.read(&mut buf).await.unwrap();
                let head = format!(
                    "HTTP/1.1 {} X\r\ncontent-type: audio/mpeg\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                socket.write_all(head.as_bytes()).await.unwrap();
                socket.write_all(body).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });
        format!("http://{}/translate_tts", addr)
    }

    fn mp3_config(endpoint: String) -> TtsConfig {
        TtsConfig {
            endpoint,
            transcode_to_wav: false,
            max_attempts: 2,
            timeout_secs: 5,
            retry_base_ms: 1,
            ..TtsConfig::default()
        }
    }

    #[tokio::test]
    async fn test_chunks_are_concatenated() {
        let endpoint = canned_server(vec![(200, b"AAA"), (200, b"BBB")]).await;
        let tts = GoogleTts::new(TtsConfig {
            chunk_chars: 10,
            ..mp3_config(endpoint)
        })
        .unwrap();
        assert_eq!(tts.output_format(), AudioFormat::Mp3);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("speech.mp3");
        tts.synthesize("hello world", "en", &out).await.unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"AAABBB");
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let endpoint = canned_server(vec![(400, b"bad lang")]).await;
        let tts = GoogleTts::new(mp3_config(endpoint)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = tts.synthesize("hello", "en", &dir.path().join("x.mp3")).await.unwrap_err();
        assert!(matches!(err, AppError::TtsError(_)));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let endpoint = canned_server(vec![(503, b"busy".as_slice()), (200, b"OK".as_slice())]).await;
        let tts = GoogleTts::new(mp3_config(endpoint)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("x.mp3");
        tts.synthesize("hello", "en", &out).await.unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"OK");
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let endpoint = canned_server(vec![(429, b"slow down".as_slice()), (503, b"busy".as_slice()), (500, b"oops".as_slice())]).await;
        let tts = GoogleTts::new(TtsConfig {
            max_attempts: 3,
            ..mp3_config(endpoint)
        })
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("x.mp3");
        let err = tts.synthesize("hello", "en", &out).await.unwrap_err();
        assert!(matches!(err, AppError::TtsError(_)));
        assert!(err.to_string().contains("after 3 attempts"), "{}", err);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_empty_text_never_hits_the_network() {
        let tts = GoogleTts::new(mp3_config("http://127.0.0.1:9/unused".to_string())).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = tts.synthesize(" \n ", "en", &dir.path().join("x.mp3")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
