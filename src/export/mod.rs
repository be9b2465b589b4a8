//! Daily point-summary output: CSV encoding, file sink and zip archive.

pub mod archive;
pub mod writer;

pub use archive::build_archive;
pub use writer::{to_csv_bytes, FileExportSink, NullExportSink};

use async_trait::async_trait;

use crate::domain::DailyExport;
use crate::error::Result;

/// Destination for per-date export rows.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn write(&self, export: &DailyExport) -> Result<()>;
}
