pub mod anomaly_alert;
pub mod audit_log;
pub mod budget_allocation;
pub mod department;
pub mod fund_source;
pub mod profile;
pub mod report;
pub mod transaction;
pub mod user;

pub use anomaly_alert::AnomalyAlert;
pub use audit_log::{AuditLog, NewAuditLog};
pub use budget_allocation::{AllocationDetail, AllocationInput, BudgetAllocation};
pub use department::{Department, DepartmentType, NewDepartment};
pub use fund_source::{FundSource, FundSourceInput, FundType};
pub use profile::Profile;
pub use report::Report;
pub use transaction::{NewTransaction, Transaction, TransactionDetail, TransactionStatus};
pub use user::User;
