use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::analytics::{
    self, budget_health, department_comparison, fund_utilization, utilization_rate, BudgetHealth,
    BudgetTotals, DepartmentBar, TypeSplit,
};
use crate::auth::{CurrentUser, DashboardKind, Role};
use crate::database::db::queries::{self, FundOrder, TxnScope};
use crate::database::models::{
    AllocationDetail, AnomalyAlert, AuditLog, Department, FundSource, TransactionDetail,
    TransactionStatus,
};
use crate::error::AppResult;

#[derive(Debug, Clone, Serialize)]
pub struct BudgetOverviewRow {
    #[serde(flatten)]
    pub allocation: AllocationDetail,
    pub utilization: Decimal,
    pub health: BudgetHealth,
}

#[derive(Debug, Clone, Serialize)]
pub struct FundUsage {
    #[serde(flatten)]
    pub fund: FundSource,
    pub utilization: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub totals: BudgetTotals,
    pub department_count: usize,
    pub fund_source_count: usize,
    pub pending_count: i64,
    pub budget_overview: Vec<BudgetOverviewRow>,
    pub alerts: Vec<AnomalyAlert>,
    pub department_comparison: Vec<DepartmentBar>,
    pub fund_sources: Vec<FundUsage>,
    pub recent_transactions: Vec<TransactionDetail>,
    pub recent_audit: Vec<AuditLog>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentHeadDashboard {
    pub department: Option<Department>,
    pub allocations: Vec<AllocationDetail>,
    pub totals: BudgetTotals,
    pub recent_transactions: Vec<TransactionDetail>,
    pub pending_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FacultyStaffDashboard {
    pub department: Option<Department>,
    pub transactions: Vec<TransactionDetail>,
    pub pending_count: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentParentDashboard {
    pub title: String,
    pub split: TypeSplit,
    pub student_services_spent: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditorDashboard {
    pub alerts: Vec<AnomalyAlert>,
    pub audit_logs: Vec<AuditLog>,
    pub flagged_transactions: Vec<TransactionDetail>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dashboard {
    Admin(AdminDashboard),
    DepartmentHead(DepartmentHeadDashboard),
    FacultyStaff(FacultyStaffDashboard),
    StudentParent(StudentParentDashboard),
    Auditor(AuditorDashboard),
}

pub fn budget_overview(allocations: &[AllocationDetail]) -> Vec<BudgetOverviewRow> {
    allocations
        .iter()
        .map(|a| BudgetOverviewRow {
            utilization: utilization_rate(a.allocated_amount, a.spent_amount),
            health: budget_health(a.allocated_amount, a.spent_amount),
            allocation: a.clone(),
        })
        .collect()
}

pub fn fund_usage(funds: Vec<FundSource>) -> Vec<FundUsage> {
    funds
        .into_iter()
        .map(|f| FundUsage {
            utilization: fund_utilization(f.total_amount, f.available_amount),
            fund: f,
        })
        .collect()
}

async fn department_of(pool: &Pool<Sqlite>, user: &CurrentUser) -> AppResult<Option<Department>> {
    match user.profile.department_id {
        Some(id) => Ok(queries::get_department(pool, id).await?),
        None => Ok(None),
    }
}

async fn admin(pool: &Pool<Sqlite>, fiscal_year: i32) -> AppResult<AdminDashboard> {
    let allocations = queries::list_allocation_details(pool, fiscal_year, None).await?;
    let funds = queries::list_fund_sources(pool, FundOrder::Newest).await?;
    let departments = queries::list_departments(pool).await?;

    Ok(AdminDashboard {
        totals: analytics::totals(&allocations),
        department_count: departments.len(),
        fund_source_count: funds.len(),
        pending_count: queries::count_transactions(pool, TxnScope::All, TransactionStatus::Pending).await?,
        budget_overview: budget_overview(&allocations),
        alerts: queries::list_unresolved_alerts(pool, 5).await?,
        department_comparison: department_comparison(&allocations),
        fund_sources: fund_usage(funds),
        recent_transactions: queries::list_transaction_details(pool, TxnScope::All, Some(5)).await?,
        recent_audit: queries::list_audit_logs(pool, 5).await?,
    })
}

async fn department_head(
    pool: &Pool<Sqlite>,
    user: &CurrentUser,
    fiscal_year: i32,
) -> AppResult<DepartmentHeadDashboard> {
    let department = department_of(pool, user).await?;
    let Some(dept) = &department else {
        return Ok(DepartmentHeadDashboard {
            department: None,
            allocations: Vec::new(),
            totals: BudgetTotals::default(),
            recent_transactions: Vec::new(),
            pending_count: 0,
        });
    };

    let allocations = queries::list_allocation_details(pool, fiscal_year, Some(dept.id)).await?;
    let scope = TxnScope::Department(dept.id);
    Ok(DepartmentHeadDashboard {
        totals: analytics::totals(&allocations),
        recent_transactions: queries::list_transaction_details(pool, scope, Some(10)).await?,
        pending_count: queries::count_transactions(pool, scope, TransactionStatus::Pending).await?,
        allocations,
        department,
    })
}

async fn faculty_staff(pool: &Pool<Sqlite>, user: &CurrentUser) -> AppResult<FacultyStaffDashboard> {
    let scope = TxnScope::CreatedBy(user.user_id);
    let transactions = queries::list_transaction_details(pool, scope, Some(10)).await?;
    // total covers the listed (most recent) transactions only
    let total_amount = transactions.iter().map(|t| t.amount).sum();

    Ok(FacultyStaffDashboard {
        department: department_of(pool, user).await?,
        pending_count: queries::count_transactions(pool, scope, TransactionStatus::Pending).await?,
        total_amount,
        transactions,
    })
}

async fn student_parent(
    pool: &Pool<Sqlite>,
    user: &CurrentUser,
    fiscal_year: i32,
) -> AppResult<StudentParentDashboard> {
    let allocations = queries::list_allocation_details(pool, fiscal_year, None).await?;
    let title = match user.role() {
        Some(Role::Parent) => "Parent Portal",
        _ => "Student Portal",
    };
    Ok(StudentParentDashboard {
        title: title.to_string(),
        split: analytics::department_type_split(&allocations),
        student_services_spent: analytics::category_spend(&allocations, "student_services"),
    })
}

async fn auditor(pool: &Pool<Sqlite>) -> AppResult<AuditorDashboard> {
    Ok(AuditorDashboard {
        alerts: queries::list_unresolved_alerts(pool, 10).await?,
        audit_logs: queries::list_audit_logs(pool, 15).await?,
        flagged_transactions: queries::list_transaction_details(
            pool,
            TxnScope::Status(TransactionStatus::Flagged),
            None,
        )
        .await?,
    })
}

/// Payload for the caller's role. Unknown or unset roles get the student view.
pub async fn build_dashboard(
    pool: &Pool<Sqlite>,
    user: &CurrentUser,
    fiscal_year: i32,
) -> AppResult<Dashboard> {
    let kind = crate::auth::dashboard_for(user.profile.role.as_deref());
    let dashboard = match kind {
        DashboardKind::Admin => Dashboard::Admin(admin(pool, fiscal_year).await?),
        DashboardKind::DepartmentHead => {
            Dashboard::DepartmentHead(department_head(pool, user, fiscal_year).await?)
        }
        DashboardKind::FacultyStaff => Dashboard::FacultyStaff(faculty_staff(pool, user).await?),
        DashboardKind::StudentParent => {
            Dashboard::StudentParent(student_parent(pool, user, fiscal_year).await?)
        }
        DashboardKind::Auditor => Dashboard::Auditor(auditor(pool).await?),
    };
    Ok(dashboard)
}
