use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::database::models::{AllocationDetail, DepartmentType, FundSource};
use crate::filter::category_label;

pub const PALETTE: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#06b6d4", "#84cc16", "#f97316",
];

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

fn percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (part / whole * HUNDRED).round_dp(2)
}

/// spent / allocated as a percentage; 0 when nothing was allocated.
pub fn utilization_rate(allocated: Decimal, spent: Decimal) -> Decimal {
    percent(spent, allocated)
}

pub fn fund_utilization(total: Decimal, available: Decimal) -> Decimal {
    percent(total - available, total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetHealth {
    Overspent,
    Moderate,
    Healthy,
}

impl BudgetHealth {
    pub fn label(&self) -> &'static str {
        match self {
            BudgetHealth::Overspent => "Overspent",
            BudgetHealth::Moderate => "Moderate",
            BudgetHealth::Healthy => "Healthy",
        }
    }
}

pub fn budget_health(allocated: Decimal, spent: Decimal) -> BudgetHealth {
    let rate = utilization_rate(allocated, spent);
    if rate > HUNDRED {
        BudgetHealth::Overspent
    } else if rate < Decimal::from(60) {
        BudgetHealth::Moderate
    } else {
        BudgetHealth::Healthy
    }
}

fn truncate_label(name: &str, max: usize) -> String {
    if name.chars().count() > max {
        let head: String = name.chars().take(max).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DistributionSlice {
    pub category: String,
    pub amount: Decimal,
    pub percent: Decimal,
    pub color: &'static str,
}

/// Allocated amount per category label, first-seen order, palette colour by position.
pub fn budget_distribution(allocations: &[AllocationDetail]) -> Vec<DistributionSlice> {
    let mut totals: Vec<(String, Decimal)> = Vec::new();
    for a in allocations {
        let label = category_label(Some(&a.category));
        match totals.iter_mut().find(|(c, _)| *c == label) {
            Some((_, amount)) => *amount += a.allocated_amount,
            None => totals.push((label, a.allocated_amount)),
        }
    }
    let grand: Decimal = totals.iter().map(|(_, a)| *a).sum();

    totals
        .into_iter()
        .enumerate()
        .map(|(i, (category, amount))| DistributionSlice {
            percent: percent(amount, grand),
            color: PALETTE[i % PALETTE.len()],
            category,
            amount,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DepartmentBar {
    pub department: String,
    pub allocated: Decimal,
    pub spent: Decimal,
    pub utilization: Decimal,
}

pub fn department_comparison(allocations: &[AllocationDetail]) -> Vec<DepartmentBar> {
    let mut totals: Vec<(String, Decimal, Decimal)> = Vec::new();
    for a in allocations {
        match totals.iter_mut().find(|(name, _, _)| *name == a.department_name) {
            Some((_, allocated, spent)) => {
                *allocated += a.allocated_amount;
                *spent += a.spent_amount;
            }
            None => totals.push((a.department_name.clone(), a.allocated_amount, a.spent_amount)),
        }
    }

    let mut bars: Vec<DepartmentBar> = totals
        .into_iter()
        .map(|(name, allocated, spent)| DepartmentBar {
            department: truncate_label(&name, 15),
            utilization: utilization_rate(allocated, spent),
            allocated,
            spent,
        })
        .collect();
    bars.sort_by(|a, b| b.allocated.cmp(&a.allocated));
    bars
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FundBar {
    pub name: String,
    pub total: Decimal,
    pub available: Decimal,
    pub utilized: Decimal,
}

pub fn fund_sources_chart(funds: &[FundSource]) -> Vec<FundBar> {
    funds
        .iter()
        .map(|f| FundBar {
            name: truncate_label(&f.name, 20),
            total: f.total_amount,
            available: f.available_amount,
            utilized: f.total_amount - f.available_amount,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendPoint {
    pub month: String,
    pub amount: Decimal,
    pub cumulative: Decimal,
}

/// Monthly completed spend with a running total. Input is (date, amount) of
/// completed transactions in any order.
pub fn spending_trends(completed: &[(NaiveDate, Decimal)]) -> Vec<TrendPoint> {
    let mut months: Vec<((i32, u32), Decimal)> = Vec::new();
    for (date, amount) in completed {
        let key = (date.year(), date.month());
        match months.iter_mut().find(|(k, _)| *k == key) {
            Some((_, total)) => *total += *amount,
            None => months.push((key, *amount)),
        }
    }
    months.sort_by_key(|(k, _)| *k);

    let mut running = Decimal::ZERO;
    months
        .into_iter()
        .filter_map(|((year, month), amount)| {
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            running += amount;
            Some(TrendPoint {
                month: first.format("%b %Y").to_string(),
                amount,
                cumulative: running,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TypeSplit {
    pub academic: Decimal,
    pub support: Decimal,
    pub academic_percent: Decimal,
    pub support_percent: Decimal,
}

pub fn department_type_split(allocations: &[AllocationDetail]) -> TypeSplit {
    let sum_for = |kind: DepartmentType| -> Decimal {
        allocations
            .iter()
            .filter(|a| a.department_type == kind)
            .map(|a| a.allocated_amount)
            .sum()
    };
    let academic = sum_for(DepartmentType::Academic);
    let support = sum_for(DepartmentType::Support);
    let total = academic + support;
    TypeSplit {
        academic,
        support,
        academic_percent: percent(academic, total),
        support_percent: percent(support, total),
    }
}

pub fn category_spend(allocations: &[AllocationDetail], category: &str) -> Decimal {
    allocations
        .iter()
        .filter(|a| a.category == category)
        .map(|a| a.spent_amount)
        .sum()
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct BudgetTotals {
    pub allocated: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub utilization: Decimal,
}

pub fn totals(allocations: &[AllocationDetail]) -> BudgetTotals {
    let allocated: Decimal = allocations.iter().map(|a| a.allocated_amount).sum();
    let spent: Decimal = allocations.iter().map(|a| a.spent_amount).sum();
    BudgetTotals {
        allocated,
        spent,
        remaining: allocated - spent,
        utilization: utilization_rate(allocated, spent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::FundType;
    use std::str::FromStr;

    fn alloc(dept: &str, kind: DepartmentType, category: &str, allocated: i64, spent: i64) -> AllocationDetail {
        AllocationDetail {
            id: 0,
            department_id: 0,
            department_name: dept.to_string(),
            department_code: dept[..2].to_uppercase(),
            department_type: kind,
            fund_source_id: 1,
            fund_name: "Government Grant".into(),
            fund_type: FundType::GovernmentGrants,
            category: category.to_string(),
            fiscal_year: 2024,
            allocated_amount: Decimal::from(allocated),
            spent_amount: Decimal::from(spent),
        }
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn zero_allocation_means_zero_utilization() {
        assert_eq!(utilization_rate(Decimal::ZERO, d("500")), Decimal::ZERO);
        assert_eq!(utilization_rate(d("200"), d("50")), d("25"));
        assert_eq!(fund_utilization(d("7000000"), d("3500000")), d("50"));
    }

    #[test]
    fn health_thresholds() {
        assert_eq!(budget_health(d("100"), d("101")), BudgetHealth::Overspent);
        assert_eq!(budget_health(d("100"), d("100")), BudgetHealth::Healthy);
        assert_eq!(budget_health(d("100"), d("60")), BudgetHealth::Healthy);
        assert_eq!(budget_health(d("100"), d("59")), BudgetHealth::Moderate);
    }

    #[test]
    fn distribution_merges_categories_and_colours_by_position() {
        let rows = vec![
            alloc("Sports", DepartmentType::Support, "student_services", 300, 0),
            alloc("Library", DepartmentType::Support, "utilities", 100, 0),
            alloc("Library", DepartmentType::Support, "student_services", 100, 0),
        ];
        let slices = budget_distribution(&rows);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].category, "STUDENT SERVICES");
        assert_eq!(slices[0].amount, d("400"));
        assert_eq!(slices[0].percent, d("80"));
        assert_eq!(slices[0].color, "#3b82f6");
        assert_eq!(slices[1].color, "#10b981");
    }

    #[test]
    fn comparison_truncates_and_sorts_by_allocation() {
        let rows = vec![
            alloc("Sports", DepartmentType::Support, "other", 800, 600),
            alloc("Mechanical Engineering", DepartmentType::Academic, "other", 1000, 500),
            alloc("Mechanical Engineering", DepartmentType::Academic, "other", 800, 700),
        ];
        let bars = department_comparison(&rows);
        assert_eq!(bars[0].department, "Mechanical Engi...");
        assert_eq!(bars[0].allocated, d("1800"));
        assert_eq!(bars[1].department, "Sports");
        assert_eq!(bars[1].utilization, d("75"));
    }

    #[test]
    fn trends_are_chronological_and_cumulative() {
        let pts = spending_trends(&[
            (NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), d("500")),
            (NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), d("100")),
            (NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), d("50")),
        ]);
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[0].month, "Jan 2024");
        assert_eq!(pts[1].month, "Jun 2024");
        assert_eq!(pts[1].amount, d("550"));
        assert_eq!(pts[1].cumulative, d("650"));
        assert!(pts.windows(2).all(|w| w[0].cumulative <= w[1].cumulative));
    }

    #[test]
    fn type_split_and_category_spend() {
        let rows = vec![
            alloc("Computer Science", DepartmentType::Academic, "salaries_benefits", 300, 100),
            alloc("Library", DepartmentType::Support, "student_services", 100, 40),
        ];
        let split = department_type_split(&rows);
        assert_eq!(split.academic_percent, d("75"));
        assert_eq!(split.support, d("100"));
        assert_eq!(category_spend(&rows, "student_services"), d("40"));

        let t = totals(&rows);
        assert_eq!(t.remaining, d("260"));
        assert_eq!(t.utilization, d("35"));
    }
}
