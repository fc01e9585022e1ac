use serde::{Deserialize, Serialize};

// Настройки синтеза речи (Google Translate TTS, тот же backend, что и у gTTS)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub endpoint: String,

    // Язык по умолчанию для загрузки текстовых файлов
    pub default_locale: String,

    // Максимальная длина одного запроса в символах
    pub chunk_chars: usize,

    pub timeout_secs: u64,
    pub max_attempts: u32,

    // Базовая пауза между повторами, удваивается с каждой попыткой
    pub retry_base_ms: u64,

    // Перекодировать MP3 в WAV через ffmpeg
    pub transcode_to_wav: bool,
    pub sample_rate: u32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        TtsConfig {
            endpoint: "https://translate.google.com/translate_tts".to_string(),
            default_locale: "vi".to_string(),
            chunk_chars: 100,
            timeout_secs: 30,
            max_attempts: 3,
            retry_base_ms: 1000,
            transcode_to_wav: true,
            sample_rate: 44100,
        }
    }
}
