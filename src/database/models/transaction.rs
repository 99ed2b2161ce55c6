use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Completed,
    Rejected,
    Flagged,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 5] = [
        Self::Pending,
        Self::Approved,
        Self::Completed,
        Self::Rejected,
        Self::Flagged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Flagged => "flagged",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| format!("unknown transaction status: {s}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub allocation_id: i64,
    pub description: String,
    pub vendor_name: Option<String>,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub transaction_date: NaiveDate,
    pub invoice_number: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A transaction joined with the category and department of its allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub id: i64,
    pub allocation_id: i64,
    pub description: String,
    pub vendor_name: Option<String>,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub transaction_date: NaiveDate,
    pub invoice_number: Option<String>,
    pub created_by: Option<i64>,
    pub category: Option<String>,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub department_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub allocation_id: i64,
    pub description: String,
    pub vendor_name: Option<String>,
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    pub invoice_number: Option<String>,
}
