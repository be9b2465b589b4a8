pub mod customer;
pub mod export;
pub mod purchase;
pub mod rule;

pub use customer::{Customer, CustomerUpdate, HistoryRecord};
pub use export::{DailyExport, ExportRow, DATE_FORMAT};
pub use purchase::{Batch, CustomerId, DedupKey, PurchaseRecord, PurchaseRow};
pub use rule::{Conditions, Reward, RewardDef, Rule, RuleDef, RuleStatus};
