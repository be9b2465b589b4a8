use axum::extract::Multipart;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::ingest::UploadedFile;

/// Multipart field carrying purchase files.
pub const UPLOAD_FIELD: &str = "csv_files";

/// Collect every `csv_files` part of an upload. Other fields are ignored.
pub async fn collect_uploads(mut multipart: Multipart) -> Result<Vec<UploadedFile>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::invalid("upload part has no file name"))?;
        let content_type = field.content_type().map(str::to_string);

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid(format!("failed to read {file_name}: {e}")))?;

        files.push(UploadedFile {
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }

    Ok(files)
}
