use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use std::io::Read;

use crate::domain::{Batch, PurchaseRow};
use crate::error::{AppError, Result};

/// Required header of an uploaded purchase file, in order.
pub const EXPECTED_HEADERS: [&str; 7] = [
    "customer_id",
    "product_id",
    "category_id",
    "category_name",
    "branch_id",
    "purchased_amount",
    "currency",
];

/// Parse one purchase CSV into a batch dated `purchase_date`.
///
/// The header must match [`EXPECTED_HEADERS`] exactly. Any unreadable row
/// rejects the whole file.
pub fn parse_batch<R: Read>(reader: R, purchase_date: NaiveDate) -> Result<Batch> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| AppError::invalid(format!("failed to read header: {e}")))?;

    if !headers.iter().eq(EXPECTED_HEADERS.iter().copied()) {
        return Err(AppError::invalid(format!(
            "CSV header mismatch. Got: {:?}, Want: {:?}",
            headers.iter().collect::<Vec<_>>(),
            EXPECTED_HEADERS
        )));
    }

    let mut rows = Vec::new();
    for (idx, row) in rdr.deserialize::<PurchaseRow>().enumerate() {
        let row = row.map_err(|e| AppError::invalid(format!("row {}: {e}", idx + 1)))?;
        rows.push(row);
    }

    Ok(Batch::new(purchase_date, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_parse_valid_file() {
        let data = "\
customer_id,product_id,category_id,category_name,branch_id,purchased_amount,currency
C1, P1, CT1001, BEVERAGE, BR3444, 100.00, THB
C2,P2,CT1002,ELECTRONICS,BR3456,1234.56,THB
";

        let batch = parse_batch(data.as_bytes(), date()).unwrap();

        assert_eq!(batch.records.len(), 2);
        let first = &batch.records[0];
        assert_eq!(first.customer_id.as_str(), "C1");
        assert_eq!(first.branch_id, "BR3444");
        assert_eq!(first.purchased_amount, dec!(100.00));
        assert_eq!(first.purchase_date, date());
        assert_eq!(batch.records[1].purchased_amount, dec!(1234.56));
    }

    #[test]
    fn test_amount_keeps_exact_scale() {
        let data = "\
customer_id,product_id,category_id,category_name,branch_id,purchased_amount,currency
C1,P1,CT1001,BEVERAGE,BR3444,0.10,THB
";

        let batch = parse_batch(data.as_bytes(), date()).unwrap();
        assert_eq!(batch.records[0].purchased_amount.to_string(), "0.10");
    }

    #[test]
    fn test_header_mismatch() {
        let data = "\
customer_id,product_id,branch_id,purchased_amount
C1,P1,BR3444,100.00
";

        let err = parse_batch(data.as_bytes(), date()).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert!(err.to_string().contains("header mismatch"));
    }

    #[test]
    fn test_reordered_header_rejected() {
        let data = "\
product_id,customer_id,category_id,category_name,branch_id,purchased_amount,currency
P1,C1,CT1001,BEVERAGE,BR3444,100.00,THB
";

        assert!(parse_batch(data.as_bytes(), date()).is_err());
    }

    #[test]
    fn test_bad_amount_names_row() {
        let data = "\
customer_id,product_id,category_id,category_name,branch_id,purchased_amount,currency
C1,P1,CT1001,BEVERAGE,BR3444,100.00,THB
C2,P2,CT1001,BEVERAGE,BR3444,abc,THB
";

        let err = parse_batch(data.as_bytes(), date()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_header_only_yields_empty_batch() {
        let data = "customer_id,product_id,category_id,category_name,branch_id,purchased_amount,currency\n";

        let batch = parse_batch(data.as_bytes(), date()).unwrap();
        assert!(batch.is_empty());
    }
}
