pub mod accrual;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod ingest;
pub mod observability;
pub mod rules;
pub mod storage;

pub use accrual::{AccrualReport, AccrualService};
pub use config::Config;
pub use domain::{Batch, Customer, CustomerUpdate, ExportRow, PurchaseRecord, Rule};
pub use error::{AppError, Result};
