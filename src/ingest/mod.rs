//! Purchase file ingestion: file-name dating and CSV parsing.

pub mod csv;

pub use self::csv::{parse_batch, EXPECTED_HEADERS};

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use crate::domain::{Batch, DATE_FORMAT};
use crate::error::{AppError, Result};

static DATE_IN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("date regex is valid"));

/// Extract the purchase date embedded in a file name.
///
/// The first `YYYY-MM-DD` substring wins; it must be a real calendar date.
pub fn purchase_date_from_filename(file_name: &str) -> Result<NaiveDate> {
    let found = DATE_IN_NAME.find(file_name).ok_or_else(|| {
        AppError::invalid(format!("filename {file_name} has no YYYY-MM-DD date"))
    })?;

    NaiveDate::parse_from_str(found.as_str(), DATE_FORMAT).map_err(|e| {
        AppError::invalid(format!("filename {file_name} has invalid date: {e}"))
    })
}

/// Whether an uploaded part looks like a CSV file.
pub fn is_csv_upload(file_name: &str, content_type: Option<&str>) -> bool {
    let has_extension = file_name.to_ascii_lowercase().ends_with(".csv");
    let csv_type = content_type.map_or(false, |ct| {
        ct.split(';')
            .next()
            .map(|mime| mime.trim().eq_ignore_ascii_case("text/csv"))
            .unwrap_or(false)
    });

    has_extension && csv_type
}

/// An uploaded purchase file, kept in memory until parsed.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Validate and parse uploaded files into dated batches.
///
/// Files are processed in ascending file-name order. Any invalid file fails
/// the whole upload.
pub fn read_batches(mut files: Vec<UploadedFile>) -> Result<Vec<Batch>> {
    if files.is_empty() {
        return Err(AppError::invalid("no files"));
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    let mut batches = Vec::with_capacity(files.len());
    for file in &files {
        if !is_csv_upload(&file.file_name, file.content_type.as_deref()) {
            return Err(AppError::invalid(format!(
                "file {} is not a CSV file",
                file.file_name
            )));
        }

        let date = purchase_date_from_filename(&file.file_name)?;
        let batch = parse_batch(file.data.as_slice(), date).map_err(|e| match e {
            AppError::InvalidArgument(msg) => {
                AppError::invalid(format!("file {}: {msg}", file.file_name))
            }
            other => other,
        })?;

        batches.push(batch);
    }

    Ok(batches)
}
