use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::analytics::{self, BudgetTotals, DepartmentBar, DistributionSlice, FundBar, TrendPoint};
use crate::auth::{CurrentUser, Role};
use crate::backend::AppState;
use crate::chat;
use crate::currency::Currency;
use crate::dashboards::{self, Dashboard};
use crate::database::db::queries::{self, FundOrder};
use crate::database::models::{
    AnomalyAlert, AuditLog, Department, NewAuditLog, NewDepartment, NewTransaction,
    TransactionDetail, TransactionStatus,
};
use crate::error::{AppError, AppResult};
use crate::filter::{self, DepartmentOption, TransactionFilter};
use crate::reports::{self, GeneratedReport, PrebuiltReport, ReportRequest};
use crate::transparency;

pub(crate) const OVERSIGHT_ROLES: [Role; 3] = [Role::SuperAdmin, Role::FinancialAdmin, Role::Auditor];

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    fn clamped(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, 200)
    }
}

/*==========Dashboards=========== */

pub async fn dashboard(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<Dashboard>> {
    let payload = dashboards::build_dashboard(&state.db, &user, state.config.fiscal_year).await?;
    Ok(Json(payload))
}

#[derive(Debug, Serialize)]
pub struct AnalyticsPayload {
    pub fiscal_year: i32,
    pub totals: BudgetTotals,
    pub budget_distribution: Vec<DistributionSlice>,
    pub department_comparison: Vec<DepartmentBar>,
    pub fund_sources: Vec<FundBar>,
    pub spending_trends: Vec<TrendPoint>,
}

pub async fn analytics(State(state): State<AppState>, _user: CurrentUser) -> AppResult<Json<AnalyticsPayload>> {
    let fiscal_year = state.config.fiscal_year;
    let allocations = queries::list_allocation_details(&state.db, fiscal_year, None).await?;
    let funds = queries::list_fund_sources(&state.db, FundOrder::LargestTotal).await?;
    let trends = transparency::spending_trends(&state.db, state.portal_settings(), Currency::Inr).await?;

    Ok(Json(AnalyticsPayload {
        fiscal_year,
        totals: analytics::totals(&allocations),
        budget_distribution: analytics::budget_distribution(&allocations),
        department_comparison: analytics::department_comparison(&allocations),
        fund_sources: analytics::fund_sources_chart(&funds),
        spending_trends: trends,
    }))
}

/*==========Transactions=========== */

async fn visible_transactions(state: &AppState, user: &CurrentUser) -> AppResult<Vec<TransactionDetail>> {
    Ok(queries::list_transaction_details(&state.db, user.transaction_scope(), None).await?)
}

#[derive(Debug, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<TransactionDetail>,
    pub total: usize,
    pub active_filters: Vec<&'static str>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(criteria): Query<TransactionFilter>,
) -> AppResult<Json<TransactionPage>> {
    let rows = visible_transactions(&state, &user).await?;
    let transactions = criteria.apply(&rows);
    Ok(Json(TransactionPage {
        total: transactions.len(),
        active_filters: criteria.active_filters(),
        transactions,
    }))
}

pub async fn export_transactions(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(criteria): Query<TransactionFilter>,
) -> AppResult<impl IntoResponse> {
    let rows = criteria.apply(&visible_transactions(&state, &user).await?);
    let body = filter::export_csv(&rows)?;
    let file_name = filter::export_file_name(Utc::now().date_naive());
    info!(user_id = user.user_id, rows = rows.len(), "transactions exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        body,
    ))
}

#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub statuses: Vec<&'static str>,
    pub departments: Vec<DepartmentOption>,
    pub categories: Vec<String>,
}

pub async fn transaction_filters(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<FilterOptions>> {
    let rows = visible_transactions(&state, &user).await?;
    Ok(Json(FilterOptions {
        statuses: TransactionStatus::ALL.iter().map(|s| s.as_str()).collect(),
        departments: filter::unique_departments(&rows),
        categories: filter::unique_categories(&rows),
    }))
}

fn forbidden(msg: &str) -> AppError {
    AppError::Forbidden(msg.to_string())
}

/// Admins may file against any allocation; heads, faculty and staff only against their department's.
pub fn authorize_submission(user: &CurrentUser, allocation_department: i64) -> AppResult<()> {
    match user.role() {
        Some(r) if r.is_admin() => Ok(()),
        Some(Role::DepartmentHead | Role::Faculty | Role::Staff)
            if user.profile.department_id == Some(allocation_department) =>
        {
            Ok(())
        }
        _ => Err(forbidden("You cannot submit transactions for this department")),
    }
}

pub fn authorize_status_change(
    user: &CurrentUser,
    transaction_department: Option<i64>,
    new_status: TransactionStatus,
) -> AppResult<()> {
    match user.role() {
        Some(r) if r.is_admin() => Ok(()),
        Some(Role::DepartmentHead)
            if user.profile.department_id.is_some()
                && user.profile.department_id == transaction_department =>
        {
            Ok(())
        }
        Some(Role::Auditor) if new_status == TransactionStatus::Flagged => Ok(()),
        _ => Err(forbidden("You cannot change the status of this transaction")),
    }
}

pub async fn create_transaction(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewTransaction>,
) -> AppResult<impl IntoResponse> {
    if payload.description.trim().is_empty() {
        return Err(AppError::validation("Description is required"));
    }
    if payload.amount <= Decimal::ZERO {
        return Err(AppError::validation("Amount must be greater than zero"));
    }
    let allocation = queries::get_allocation(&state.db, payload.allocation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Allocation"))?;
    authorize_submission(&user, allocation.department_id)?;

    let id = queries::insert_transaction(&state.db, &payload, TransactionStatus::Pending, Some(user.user_id)).await?;
    queries::append_audit(
        &state.db,
        &NewAuditLog::info(
            Some(&user.email),
            "Transaction Created",
            "transaction",
            format!("#{id} {} {}", payload.description.trim(), payload.amount),
        ),
    )
    .await?;

    let detail = queries::get_transaction_detail(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction"))?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub async fn update_transaction_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdate>,
) -> AppResult<Json<TransactionDetail>> {
    let new_status: TransactionStatus = payload.status.parse().map_err(AppError::Validation)?;
    let current = queries::get_transaction_detail(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction"))?;
    authorize_status_change(&user, current.department_id, new_status)?;

    let previous = queries::update_transaction_status(&state.db, id, new_status)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction"))?;

    let severity = if new_status == TransactionStatus::Flagged { "warning" } else { "info" };
    queries::append_audit(
        &state.db,
        &NewAuditLog::info(
            Some(&user.email),
            "Transaction Status Changed",
            "transaction",
            format!("#{id} {} -> {}", previous.as_str(), new_status.as_str()),
        )
        .with_severity(severity),
    )
    .await?;
    info!(transaction_id = id, from = previous.as_str(), to = new_status.as_str(), "status changed");

    let updated = queries::get_transaction_detail(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction"))?;
    Ok(Json(updated))
}

/*==========Alerts and Audit=========== */

pub async fn list_alerts(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(q): Query<LimitQuery>,
) -> AppResult<Json<Vec<AnomalyAlert>>> {
    user.require_any(&OVERSIGHT_ROLES)?;
    Ok(Json(queries::list_unresolved_alerts(&state.db, q.clamped(20)).await?))
}

pub async fn resolve_alert(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    user.require_any(&OVERSIGHT_ROLES)?;
    if !queries::resolve_alert(&state.db, id).await? {
        return Err(AppError::not_found("Alert"));
    }
    queries::append_audit(
        &state.db,
        &NewAuditLog::info(Some(&user.email), "Alert Resolved", "anomaly_alert", format!("alert #{id}")),
    )
    .await?;
    Ok(Json(json!({ "id": id, "resolved": true })))
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(q): Query<LimitQuery>,
) -> AppResult<Json<Vec<AuditLog>>> {
    user.require_any(&OVERSIGHT_ROLES)?;
    Ok(Json(queries::list_audit_logs(&state.db, q.clamped(50)).await?))
}

/*==========Departments=========== */

pub async fn list_departments(State(state): State<AppState>, _user: CurrentUser) -> AppResult<Json<Vec<Department>>> {
    Ok(Json(queries::list_departments(&state.db).await?))
}

pub async fn create_department(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewDepartment>,
) -> AppResult<impl IntoResponse> {
    user.require_admin()?;
    if payload.name.trim().is_empty() || payload.code.trim().is_empty() {
        return Err(AppError::validation("Department name and code are required"));
    }

    let id = queries::create_department(&state.db, &payload).await.map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("A department with this code already exists".into())
        }
        other => AppError::Database(other),
    })?;
    queries::append_audit(
        &state.db,
        &NewAuditLog::info(Some(&user.email), "Department Created", "department", payload.code.trim().to_uppercase()),
    )
    .await?;

    let created = queries::get_department(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Department"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

/*==========Reports=========== */

pub async fn generate_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ReportRequest>,
) -> AppResult<Json<GeneratedReport>> {
    let report = reports::generate(&state.db, &user, state.config.fiscal_year, req).await?;
    Ok(Json(report))
}

pub async fn download_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let file = reports::download(&state.db, &user, &id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file.file_name)),
        ],
        file.content,
    ))
}

pub async fn prebuilt_reports(user: CurrentUser) -> Json<Vec<PrebuiltReport>> {
    Json(reports::prebuilt_catalog(user.profile.role.as_deref()))
}

/*==========Chat=========== */

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

pub async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> AppResult<impl IntoResponse> {
    let prompt = req.prompt.unwrap_or_default();
    let response = chat::answer(&state.db, state.chat.as_ref(), state.portal_settings(), &prompt).await?;
    Ok(Json(json!({ "response": response })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Profile;

    fn user(role: Option<&str>, department_id: Option<i64>) -> CurrentUser {
        CurrentUser {
            user_id: 7,
            email: "someone@acear.edu".into(),
            profile: Profile {
                id: 1,
                user_id: 7,
                email: "someone@acear.edu".into(),
                full_name: "Someone".into(),
                role: role.map(str::to_string),
                department_id,
                created_at: Utc::now(),
            },
        }
    }

    #[test]
    fn heads_change_status_only_in_their_department() {
        let head = user(Some("department_head"), Some(1));
        assert!(authorize_status_change(&head, Some(1), TransactionStatus::Approved).is_ok());
        assert!(authorize_status_change(&head, Some(2), TransactionStatus::Approved).is_err());
    }

    #[test]
    fn auditors_may_only_flag() {
        let auditor = user(Some("auditor"), None);
        assert!(authorize_status_change(&auditor, Some(1), TransactionStatus::Flagged).is_ok());
        assert!(authorize_status_change(&auditor, Some(1), TransactionStatus::Completed).is_err());
    }

    #[test]
    fn students_cannot_change_status_and_admins_can() {
        let student = user(Some("student"), None);
        let admin = user(Some("financial_admin"), None);
        assert!(authorize_status_change(&student, Some(1), TransactionStatus::Flagged).is_err());
        assert!(authorize_status_change(&admin, None, TransactionStatus::Completed).is_ok());
    }

    #[test]
    fn submissions_are_limited_to_own_department() {
        let faculty = user(Some("faculty"), Some(3));
        assert!(authorize_submission(&faculty, 3).is_ok());
        assert!(authorize_submission(&faculty, 4).is_err());
        assert!(authorize_submission(&user(Some("student"), Some(3)), 3).is_err());
    }
}
