use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::DailyExport;
use crate::error::{AppError, Result};

use super::writer::to_csv_bytes;

/// Pack daily exports into one zip, one CSV entry per export.
pub fn build_archive(exports: &[DailyExport]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for export in exports {
        let bytes = to_csv_bytes(&export.rows)?;

        zip.start_file(export.file_name(), options)
            .map_err(|e| AppError::internal(format!("failed to add {}: {e}", export.file_name())))?;
        zip.write_all(&bytes)?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| AppError::internal(format!("failed to finish archive: {e}")))?;

    Ok(cursor.into_inner())
}
