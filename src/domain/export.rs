use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::purchase::CustomerId;

/// Date format used in file names, export rows and per-date keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One line of the cumulative-points-as-of-date report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub customer_id: CustomerId,
    pub points: i64,
    #[serde(with = "date_only")]
    pub last_purchase_date: NaiveDate,
}

/// Export rows for a single purchase date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyExport {
    pub date: NaiveDate,
    pub rows: Vec<ExportRow>,
}

impl DailyExport {
    /// Archive entry name for this date.
    pub fn file_name(&self) -> String {
        format!("point-summary_{}.csv", self.date.format(DATE_FORMAT))
    }
}

mod date_only {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
