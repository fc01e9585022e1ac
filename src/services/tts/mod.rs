//! # TTS
//!
//! Синтез речи из текста. Сам синтез выполняет внешний сервис, здесь только
//! разбиение текста на запросы и сохранение результата.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::errors::{AppError, AppResult};

mod google;

pub use google::GoogleTts;

/// Container of a synthesized file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Format of the files `synthesize` writes
    fn output_format(&self) -> AudioFormat;

    /// Speak `text` in language `lang` into `destination`.
    async fn synthesize(&self, text: &str, lang: &str, destination: &Path) -> AppResult<()>;
}

// BCP-47-ish: "vi", "en", "zh-CN", "pt-BR"
static LANG_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("valid language pattern"));

/// Checks input shared by every synthesizer before any request goes out.
pub fn validate_request(text: &str, lang: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::bad_request("No text to speak"));
    }
    if !LANG_CODE.is_match(lang.trim()) {
        return Err(AppError::bad_request(format!("Unsupported language code '{}'", lang)));
    }
    Ok(())
}

/// Split text into request-sized pieces of at most `max_chars` characters.
///
/// Paragraphs never share a piece. Inside a paragraph words are packed
/// greedily; a single word longer than the limit is cut.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            for piece in cut_word(word, max_chars) {
                let piece_len = piece.chars().count();
                let needed = if current.is_empty() { piece_len } else { current_len + 1 + piece_len };
                if needed > max_chars && !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                if !current.is_empty() {
                    current.push(' ');
                    current_len += 1;
                }
                current.push_str(&piece);
                current_len += piece_len;
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }
    }

    chunks
}

fn cut_word(word: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars.chunks(max_chars).map(|c| c.iter().collect()).collect()
}
