use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::analytics::{self, fund_utilization, utilization_rate, TrendPoint};
use crate::currency::{convert, Currency};
use crate::database::db::queries::{self, FundOrder};
use crate::database::models::{AllocationDetail, DepartmentType, FundSource, FundType};
use crate::error::AppResult;

/// Public portal query string. Text filters are case-insensitive substrings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PortalQuery {
    pub search: Option<String>,
    pub department: Option<String>,
    pub vendor: Option<String>,
    pub currency: Currency,
}

fn needle(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

impl PortalQuery {
    pub fn is_filtered(&self) -> bool {
        needle(&self.search).is_some() || needle(&self.department).is_some() || needle(&self.vendor).is_some()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PortalSettings {
    pub fiscal_year: i32,
    pub usd_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublicDepartment {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub dept_type: DepartmentType,
    pub description: String,
    pub allocated: Decimal,
    pub spent: Decimal,
    pub utilization: Decimal,
    pub vendors: Vec<String>,
    #[serde(skip)]
    pub fund_ids: BTreeSet<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PortalStats {
    pub total_allocated: Decimal,
    pub total_spent: Decimal,
    pub utilization: Decimal,
    pub departments_count: usize,
    pub fund_sources_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TypeBreakdown {
    pub academic_total: Decimal,
    pub support_total: Decimal,
    pub academic_percent: Decimal,
    pub support_percent: Decimal,
    pub academic_count: usize,
    pub support_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicFund {
    pub id: i64,
    pub name: String,
    pub fund_type: FundType,
    pub description: String,
    pub total: Decimal,
    pub available: Decimal,
    pub utilization: Decimal,
    pub grant_period_start: Option<NaiveDate>,
    pub grant_period_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FundSummary {
    pub currency: Currency,
    pub total_funding: Decimal,
    pub funds: Vec<PublicFund>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalOverview {
    pub currency: Currency,
    pub fiscal_year: i32,
    pub stats: PortalStats,
    pub breakdown: TypeBreakdown,
    pub departments: Vec<PublicDepartment>,
    pub fund_sources: FundSummary,
    pub spending_trends: Vec<TrendPoint>,
}

/// Rolls fiscal-year allocations up to one row per department, in department name order.
pub fn aggregate_departments(
    allocations: &[AllocationDetail],
    vendors: &[(i64, String)],
) -> Vec<PublicDepartment> {
    let mut rows: Vec<PublicDepartment> = Vec::new();
    for a in allocations {
        let existing = rows.iter().position(|d| d.id == a.department_id);
        let row = match existing {
            Some(i) => &mut rows[i],
            None => {
                rows.push(PublicDepartment {
                    id: a.department_id,
                    name: a.department_name.clone(),
                    code: a.department_code.clone(),
                    dept_type: a.department_type,
                    description: String::new(),
                    allocated: Decimal::ZERO,
                    spent: Decimal::ZERO,
                    utilization: Decimal::ZERO,
                    vendors: Vec::new(),
                    fund_ids: BTreeSet::new(),
                });
                let last = rows.len() - 1;
                &mut rows[last]
            }
        };
        row.allocated += a.allocated_amount;
        row.spent += a.spent_amount;
        row.fund_ids.insert(a.fund_source_id);
    }
    for row in rows.iter_mut() {
        row.utilization = utilization_rate(row.allocated, row.spent);
        row.vendors = vendors
            .iter()
            .filter(|(dept, _)| *dept == row.id)
            .map(|(_, v)| v.clone())
            .collect();
    }
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

/// Search hits name or code; department filter hits name; vendor filter hits any vendor.
pub fn filter_departments(rows: Vec<PublicDepartment>, q: &PortalQuery) -> Vec<PublicDepartment> {
    let search = needle(&q.search);
    let dept = needle(&q.department);
    let vendor = needle(&q.vendor);

    rows.into_iter()
        .filter(|d| {
            let name = d.name.to_lowercase();
            let code = d.code.to_lowercase();
            search.as_ref().map_or(true, |s| name.contains(s) || code.contains(s))
                && dept.as_ref().map_or(true, |s| name.contains(s))
                && vendor.as_ref().map_or(true, |s| {
                    d.vendors.iter().any(|v| v.to_lowercase().contains(s))
                })
        })
        .collect()
}

pub fn portal_stats(rows: &[PublicDepartment], fund_count: usize, filtered: bool) -> PortalStats {
    let total_allocated: Decimal = rows.iter().map(|d| d.allocated).sum();
    let total_spent: Decimal = rows.iter().map(|d| d.spent).sum();
    // under a filter, only the funds feeding the matched departments count
    let fund_sources_count = if filtered {
        rows.iter().flat_map(|d| d.fund_ids.iter()).collect::<BTreeSet<_>>().len()
    } else {
        fund_count
    };
    PortalStats {
        utilization: utilization_rate(total_allocated, total_spent),
        total_allocated,
        total_spent,
        departments_count: rows.len(),
        fund_sources_count,
    }
}

pub fn type_breakdown(rows: &[PublicDepartment]) -> TypeBreakdown {
    let (academic, support): (Vec<&PublicDepartment>, Vec<&PublicDepartment>) =
        rows.iter().partition(|d| d.dept_type == DepartmentType::Academic);
    let academic_total: Decimal = academic.iter().map(|d| d.allocated).sum();
    let support_total: Decimal = support.iter().map(|d| d.allocated).sum();
    let grand = academic_total + support_total;
    let pct = |part: Decimal| {
        if grand > Decimal::ZERO {
            (part / grand * Decimal::ONE_HUNDRED).round_dp(1)
        } else {
            Decimal::ZERO
        }
    };
    TypeBreakdown {
        academic_percent: pct(academic_total),
        support_percent: pct(support_total),
        academic_total,
        support_total,
        academic_count: academic.len(),
        support_count: support.len(),
    }
}

fn convert_department(mut d: PublicDepartment, currency: Currency, rate: Decimal) -> PublicDepartment {
    d.allocated = convert(d.allocated, currency, rate);
    d.spent = convert(d.spent, currency, rate);
    d
}

fn convert_stats(mut s: PortalStats, currency: Currency, rate: Decimal) -> PortalStats {
    s.total_allocated = convert(s.total_allocated, currency, rate);
    s.total_spent = convert(s.total_spent, currency, rate);
    s
}

pub fn fund_summary(funds: Vec<FundSource>, currency: Currency, rate: Decimal) -> FundSummary {
    let total_funding = funds.iter().map(|f| f.total_amount).sum();
    FundSummary {
        currency,
        total_funding: convert(total_funding, currency, rate),
        funds: funds
            .into_iter()
            .map(|f| PublicFund {
                utilization: fund_utilization(f.total_amount, f.available_amount),
                total: convert(f.total_amount, currency, rate),
                available: convert(f.available_amount, currency, rate),
                id: f.id,
                name: f.name,
                fund_type: f.fund_type,
                description: f.description,
                grant_period_start: f.grant_period_start,
                grant_period_end: f.grant_period_end,
            })
            .collect(),
    }
}

async fn load_departments(pool: &Pool<Sqlite>, fiscal_year: i32) -> AppResult<Vec<PublicDepartment>> {
    let allocations = queries::list_allocation_details(pool, fiscal_year, None).await?;
    let vendors = queries::department_vendors(pool).await?;
    let mut rows = aggregate_departments(&allocations, &vendors);
    for dept in queries::list_departments(pool).await? {
        match rows.iter_mut().find(|r| r.id == dept.id) {
            Some(row) => row.description = dept.description,
            // departments without allocations still appear, with zero totals
            None => rows.push(PublicDepartment {
                id: dept.id,
                name: dept.name,
                code: dept.code,
                dept_type: dept.dept_type,
                description: dept.description,
                allocated: Decimal::ZERO,
                spent: Decimal::ZERO,
                utilization: Decimal::ZERO,
                vendors: vendors
                    .iter()
                    .filter(|(id, _)| *id == dept.id)
                    .map(|(_, v)| v.clone())
                    .collect(),
                fund_ids: BTreeSet::new(),
            }),
        }
    }
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(rows)
}

pub async fn public_departments(
    pool: &Pool<Sqlite>,
    settings: PortalSettings,
    q: &PortalQuery,
) -> AppResult<Vec<PublicDepartment>> {
    let rows = filter_departments(load_departments(pool, settings.fiscal_year).await?, q);
    Ok(rows
        .into_iter()
        .map(|d| convert_department(d, q.currency, settings.usd_rate))
        .collect())
}

pub async fn stats(pool: &Pool<Sqlite>, settings: PortalSettings, q: &PortalQuery) -> AppResult<PortalStats> {
    let rows = filter_departments(load_departments(pool, settings.fiscal_year).await?, q);
    let fund_count = queries::list_fund_sources(pool, FundOrder::LargestTotal).await?.len();
    let s = portal_stats(&rows, fund_count, q.is_filtered());
    Ok(convert_stats(s, q.currency, settings.usd_rate))
}

pub async fn fund_sources(pool: &Pool<Sqlite>, settings: PortalSettings, currency: Currency) -> AppResult<FundSummary> {
    let funds = queries::list_fund_sources(pool, FundOrder::LargestTotal).await?;
    Ok(fund_summary(funds, currency, settings.usd_rate))
}

pub async fn spending_trends(
    pool: &Pool<Sqlite>,
    settings: PortalSettings,
    currency: Currency,
) -> AppResult<Vec<TrendPoint>> {
    let from = NaiveDate::from_ymd_opt(settings.fiscal_year, 1, 1).unwrap_or(NaiveDate::MIN);
    let to = NaiveDate::from_ymd_opt(settings.fiscal_year, 12, 31).unwrap_or(NaiveDate::MAX);
    let completed = queries::completed_between(pool, from, to).await?;
    Ok(analytics::spending_trends(&completed)
        .into_iter()
        .map(|mut p| {
            p.amount = convert(p.amount, currency, settings.usd_rate);
            p.cumulative = convert(p.cumulative, currency, settings.usd_rate);
            p
        })
        .collect())
}

pub async fn overview(pool: &Pool<Sqlite>, settings: PortalSettings, q: &PortalQuery) -> AppResult<PortalOverview> {
    let rows = filter_departments(load_departments(pool, settings.fiscal_year).await?, q);
    let fund_summary = fund_sources(pool, settings, q.currency).await?;
    let stats = portal_stats(&rows, fund_summary.funds.len(), q.is_filtered());
    let mut breakdown = type_breakdown(&rows);

    let rate = settings.usd_rate;
    breakdown.academic_total = convert(breakdown.academic_total, q.currency, rate);
    breakdown.support_total = convert(breakdown.support_total, q.currency, rate);

    Ok(PortalOverview {
        currency: q.currency,
        fiscal_year: settings.fiscal_year,
        stats: convert_stats(stats, q.currency, rate),
        breakdown,
        departments: rows.into_iter().map(|d| convert_department(d, q.currency, rate)).collect(),
        fund_sources: fund_summary,
        spending_trends: spending_trends(pool, settings, q.currency).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(dept_id: i64, name: &str, code: &str, kind: DepartmentType, fund: i64, allocated: i64, spent: i64) -> AllocationDetail {
        AllocationDetail {
            id: 0,
            department_id: dept_id,
            department_name: name.into(),
            department_code: code.into(),
            department_type: kind,
            fund_source_id: fund,
            fund_name: String::new(),
            fund_type: FundType::Other,
            category: "other".into(),
            fiscal_year: 2024,
            allocated_amount: Decimal::from(allocated),
            spent_amount: Decimal::from(spent),
        }
    }

    fn rows() -> Vec<PublicDepartment> {
        let allocations = vec![
            alloc(1, "Computer Science", "CS", DepartmentType::Academic, 1, 1_200_000, 950_000),
            alloc(1, "Computer Science", "CS", DepartmentType::Academic, 5, 800_000, 550_000),
            alloc(2, "Library", "LIB", DepartmentType::Support, 2, 1_000_000, 800_000),
        ];
        let vendors = vec![(1, "TechLabs Pvt Ltd".to_string()), (2, "EduSoft Pvt Ltd".to_string())];
        aggregate_departments(&allocations, &vendors)
    }

    #[test]
    fn allocations_roll_up_per_department() {
        let r = rows();
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].name, "Computer Science");
        assert_eq!(r[0].allocated, Decimal::from(2_000_000));
        assert_eq!(r[0].spent, Decimal::from(1_500_000));
        assert_eq!(r[0].utilization, Decimal::from(75));
        assert_eq!(r[0].vendors, vec!["TechLabs Pvt Ltd"]);
    }

    #[test]
    fn filters_are_case_insensitive_and_combined() {
        let q = PortalQuery { search: Some("cs".into()), ..Default::default() };
        assert_eq!(filter_departments(rows(), &q).len(), 1);

        let q = PortalQuery { vendor: Some("edusoft".into()), ..Default::default() };
        let hit = filter_departments(rows(), &q);
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].code, "LIB");

        let q = PortalQuery {
            department: Some("library".into()),
            vendor: Some("techlabs".into()),
            ..Default::default()
        };
        assert!(filter_departments(rows(), &q).is_empty());
    }

    #[test]
    fn stats_follow_the_filtered_rows() {
        let all = portal_stats(&rows(), 5, false);
        assert_eq!(all.total_allocated, Decimal::from(3_000_000));
        assert_eq!(all.fund_sources_count, 5);
        assert_eq!(all.departments_count, 2);

        let q = PortalQuery { search: Some("computer".into()), ..Default::default() };
        let filtered = filter_departments(rows(), &q);
        let s = portal_stats(&filtered, 5, true);
        assert_eq!(s.fund_sources_count, 2);
        assert_eq!(s.utilization, Decimal::from(75));
    }

    #[test]
    fn breakdown_splits_by_type() {
        let b = type_breakdown(&rows());
        assert_eq!(b.academic_count, 1);
        assert_eq!(b.support_total, Decimal::from(1_000_000));
        assert_eq!(b.academic_percent, Decimal::new(667, 1));
    }
}
