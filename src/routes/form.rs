use axum::extract::Multipart;
use std::collections::HashMap;
use std::path::Path;

use crate::errors::{AppError, AppResult};
use crate::services::uploads::SpooledUpload;

const FILE_FIELD: &str = "file";

/// A multipart form with its `file` part already spooled to disk.
pub struct UploadForm {
    fields: HashMap<String, String>,
    file: Option<SpooledUpload>,
}

impl UploadForm {
    /// Drain `multipart`; the file goes to a temporary file under `spool_dir`.
    pub async fn read(mut multipart: Multipart, spool_dir: &Path) -> AppResult<Self> {
        let mut fields = HashMap::new();
        let mut file = None;

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            if name == FILE_FIELD {
                let mut upload = SpooledUpload::new_in(spool_dir, field.file_name())?;
                while let Some(chunk) = field.chunk().await? {
                    upload.write_chunk(&chunk).await?;
                }
                upload.finish().await?;
                file = Some(upload);
            } else if !name.is_empty() {
                fields.insert(name, field.text().await?);
            }
        }

        Ok(Self { fields, file })
    }

    pub fn text(&self, name: &str) -> AppResult<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::bad_request(format!("Field '{}' is required", name)))
    }

    /// Optional field; blank values count as missing
    pub fn text_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.fields.get(name).map(|v| v.trim()) {
            Some(value) if !value.is_empty() => value,
            _ => default,
        }
    }

    pub fn take_file(&mut self) -> AppResult<SpooledUpload> {
        self.file
            .take()
            .ok_or_else(|| AppError::bad_request(format!("Field '{}' is required", FILE_FIELD)))
    }
}
