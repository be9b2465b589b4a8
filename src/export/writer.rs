use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::domain::{DailyExport, ExportRow, DATE_FORMAT};
use crate::error::{AppError, Result};

use super::ExportSink;

/// Encode rows as CSV with a `customer_id,points,last_purchase_date` header.
///
/// The header is written even when there are no rows.
pub fn to_csv_bytes(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    wtr.write_record(["customer_id", "points", "last_purchase_date"])?;
    for row in rows {
        wtr.serialize(row)?;
    }

    wtr.into_inner()
        .map_err(|e| AppError::internal(format!("failed to flush CSV: {e}")))
}

/// Writes each daily export to a file derived from a path template.
///
/// `{date}` in the template is replaced with the export date.
#[derive(Debug, Clone)]
pub struct FileExportSink {
    path_template: String,
}

impl FileExportSink {
    pub fn new(path_template: impl Into<String>) -> Self {
        Self {
            path_template: path_template.into(),
        }
    }

    pub fn path_for(&self, export: &DailyExport) -> PathBuf {
        let date = export.date.format(DATE_FORMAT).to_string();
        PathBuf::from(self.path_template.replace("{date}", &date))
    }
}

#[async_trait]
impl ExportSink for FileExportSink {
    async fn write(&self, export: &DailyExport) -> Result<()> {
        let path = self.path_for(export);
        let bytes = to_csv_bytes(&export.rows)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        info!(path = %path.display(), rows = export.rows.len(), "Export written");
        Ok(())
    }
}

/// Discards exports. For runs that only need the returned archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullExportSink;

#[async_trait]
impl ExportSink for NullExportSink {
    async fn write(&self, _export: &DailyExport) -> Result<()> {
        Ok(())
    }
}
