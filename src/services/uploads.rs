use log::debug;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// An uploaded file streamed to a temporary file next to its final home.
///
/// Multipart fields arrive in any order, so the file is spooled first and
/// moved into place once the other fields say where it belongs. Dropping an
/// unpersisted upload deletes it.
#[derive(Debug)]
pub struct SpooledUpload {
    file_name: String,
    temp: NamedTempFile,
    writer: tokio::fs::File,
    size: u64,
}

impl SpooledUpload {
    pub fn new_in(spool_dir: &Path, original_name: Option<&str>) -> AppResult<Self> {
        std::fs::create_dir_all(spool_dir)?;
        let temp = tempfile::Builder::new().prefix(".upload-").tempfile_in(spool_dir)?;
        let writer = tokio::fs::File::from_std(temp.reopen()?);
        Ok(Self {
            file_name: sanitize_file_name(original_name),
            temp,
            writer,
            size: 0,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> AppResult<()> {
        self.writer.write_all(chunk).await?;
        self.size += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(&mut self) -> AppResult<()> {
        self.writer.flush().await?;
        debug!("Spooled upload '{}' ({} bytes)", self.file_name, self.size);
        Ok(())
    }

    /// File name as sent by the client, reduced to its last path component
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub async fn read_bytes(&self) -> AppResult<Vec<u8>> {
        Ok(tokio::fs::read(self.temp.path()).await?)
    }

    /// Move the upload to `destination`, creating parent directories.
    pub fn persist(self, destination: &Path) -> AppResult<PathBuf> {
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.temp
            .persist(destination)
            .map_err(|e| AppError::IoError(e.error))?;
        Ok(destination.to_path_buf())
    }
}

/// Last path component of a client-supplied name; never empty, never `..`.
pub fn sanitize_file_name(original: Option<&str>) -> String {
    original
        .map(|name| name.rsplit(['/', '\\']).next().unwrap_or("").trim())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
        .unwrap_or_else(|| "upload".to_string())
}

/// Fresh `<uuid><suffix>.<extension>` path inside `dir`
pub fn session_file(dir: &Path, suffix: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}{}.{}", Uuid::new_v4(), suffix, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name(Some("voice.wav")), "voice.wav");
        assert_eq!(sanitize_file_name(Some("C:\\Users\\me\\voice.wav")), "voice.wav");
        assert_eq!(sanitize_file_name(Some("../../etc/passwd")), "passwd");
        assert_eq!(sanitize_file_name(Some("..")), "upload");
        assert_eq!(sanitize_file_name(Some("dir/")), "upload");
        assert_eq!(sanitize_file_name(None), "upload");
    }

    #[tokio::test]
    async fn test_spool_then_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut upload = SpooledUpload::new_in(dir.path(), Some("take1.wav")).unwrap();
        upload.write_chunk(b"RIFF").await.unwrap();
        upload.write_chunk(b"data").await.unwrap();
        upload.finish().await.unwrap();

        assert_eq!(upload.size(), 8);
        assert_eq!(upload.read_bytes().await.unwrap(), b"RIFFdata");

        let destination = dir.path().join("audio_data/alice_1_abcd1234").join(upload.file_name().to_string());
        let spooled = upload.path().to_path_buf();
        let saved = upload.persist(&destination).unwrap();
        assert_eq!(std::fs::read(&saved).unwrap(), b"RIFFdata");
        assert!(!spooled.exists());
    }

    #[tokio::test]
    async fn test_dropped_upload_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let upload = SpooledUpload::new_in(dir.path(), Some("x.wav")).unwrap();
        let spooled = upload.path().to_path_buf();
        assert!(spooled.exists());
        drop(upload);
        assert!(!spooled.exists());
    }

    #[test]
    fn test_session_file_names() {
        let a = session_file(Path::new("files"), "_processed", "wav");
        let b = session_file(Path::new("files"), "_processed", "wav");
        assert_ne!(a, b);
        assert!(a.to_string_lossy().ends_with("_processed.wav"));
    }
}
