use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::database::models::{DepartmentType, FundType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub id: i64,
    pub department_id: i64,
    pub fund_source_id: i64,
    pub category: String,
    pub fiscal_year: i32,
    pub allocated_amount: Decimal,
    pub spent_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

// allocation joined with its department and fund source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationDetail {
    pub id: i64,
    pub department_id: i64,
    pub department_name: String,
    pub department_code: String,
    pub department_type: DepartmentType,
    pub fund_source_id: i64,
    pub fund_name: String,
    pub fund_type: FundType,
    pub category: String,
    pub fiscal_year: i32,
    pub allocated_amount: Decimal,
    pub spent_amount: Decimal,
}

impl AllocationDetail {
    pub fn remaining(&self) -> Decimal {
        self.allocated_amount - self.spent_amount
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllocationInput {
    pub department_id: i64,
    pub fund_source_id: i64,
    pub category: String,
    pub fiscal_year: i32,
    pub allocated_amount: Decimal,
    #[serde(default)]
    pub spent_amount: Decimal,
}
