use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundType {
    GovernmentGrants,
    TuitionFees,
    Donations,
    ResearchGrants,
    Endowment,
    Other,
}

impl FundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GovernmentGrants => "government_grants",
            Self::TuitionFees => "tuition_fees",
            Self::Donations => "donations",
            Self::ResearchGrants => "research_grants",
            Self::Endowment => "endowment",
            Self::Other => "other",
        }
    }
}

impl FromStr for FundType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "government_grants" => Ok(Self::GovernmentGrants),
            "tuition_fees" => Ok(Self::TuitionFees),
            "donations" => Ok(Self::Donations),
            "research_grants" => Ok(Self::ResearchGrants),
            "endowment" => Ok(Self::Endowment),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown fund type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundSource {
    pub id: i64,
    pub name: String,
    pub fund_type: FundType,
    pub total_amount: Decimal,
    pub available_amount: Decimal,
    pub description: String,
    pub grant_period_start: Option<NaiveDate>,
    pub grant_period_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Create/update payload for a fund source.
#[derive(Debug, Clone, Deserialize)]
pub struct FundSourceInput {
    pub name: String,
    pub fund_type: FundType,
    pub total_amount: Decimal,
    pub available_amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub grant_period_start: Option<NaiveDate>,
    pub grant_period_end: Option<NaiveDate>,
}
