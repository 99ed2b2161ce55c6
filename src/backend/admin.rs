use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::auth::{CurrentUser, Role};
use crate::backend::AppState;
use crate::dashboards::{fund_usage, FundUsage};
use crate::database::db::queries::{self, FundOrder};
use crate::database::models::{
    AllocationDetail, AllocationInput, FundSource, FundSourceInput, NewAuditLog, Profile,
};
use crate::error::{AppError, AppResult};

async fn audit(state: &AppState, user: &CurrentUser, action: &str, entity: &str, details: String) -> AppResult<()> {
    queries::append_audit(&state.db, &NewAuditLog::info(Some(&user.email), action, entity, details)).await?;
    Ok(())
}

/*==========Fund Sources=========== */

fn validate_fund(f: &FundSourceInput) -> AppResult<()> {
    if f.name.trim().is_empty() {
        return Err(AppError::validation("Fund source name is required"));
    }
    if f.total_amount < Decimal::ZERO || f.available_amount < Decimal::ZERO {
        return Err(AppError::validation("Amounts cannot be negative"));
    }
    if f.available_amount > f.total_amount {
        return Err(AppError::validation("Available amount cannot exceed the total amount"));
    }
    if let (Some(start), Some(end)) = (f.grant_period_start, f.grant_period_end) {
        if end < start {
            return Err(AppError::validation("Grant period ends before it starts"));
        }
    }
    Ok(())
}

pub async fn list_funds(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<Vec<FundUsage>>> {
    user.require_admin()?;
    let funds = queries::list_fund_sources(&state.db, FundOrder::Newest).await?;
    Ok(Json(fund_usage(funds)))
}

pub async fn create_fund(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<FundSourceInput>,
) -> AppResult<impl IntoResponse> {
    user.require_admin()?;
    validate_fund(&payload)?;

    let id = queries::create_fund_source(&state.db, &payload).await?;
    audit(&state, &user, "Fund Source Created", "fund_source", payload.name.trim().to_string()).await?;
    info!(fund_id = id, "fund source created");

    let fund = fetch_fund(&state, id).await?;
    Ok((StatusCode::CREATED, Json(fund)))
}

async fn fetch_fund(state: &AppState, id: i64) -> AppResult<FundSource> {
    queries::get_fund_source(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Fund source"))
}

pub async fn update_fund(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<FundSourceInput>,
) -> AppResult<Json<FundSource>> {
    user.require_admin()?;
    validate_fund(&payload)?;
    if !queries::update_fund_source(&state.db, id, &payload).await? {
        return Err(AppError::not_found("Fund source"));
    }
    audit(&state, &user, "Fund Source Updated", "fund_source", format!("#{id} {}", payload.name.trim())).await?;
    Ok(Json(fetch_fund(&state, id).await?))
}

pub async fn delete_fund(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    user.require_admin()?;
    let fund = fetch_fund(&state, id).await?;
    if queries::count_allocations_for_fund(&state.db, id).await? > 0 {
        return Err(AppError::Conflict("Fund source still has budget allocations".into()));
    }
    queries::delete_fund_source(&state.db, id).await?;
    audit(&state, &user, "Fund Source Deleted", "fund_source", format!("#{id} {}", fund.name)).await?;
    Ok(Json(json!({ "id": id, "deleted": true })))
}

/*==========Budget Allocations=========== */

async fn validate_allocation(state: &AppState, a: &AllocationInput) -> AppResult<()> {
    if a.category.trim().is_empty() {
        return Err(AppError::validation("Category is required"));
    }
    if a.allocated_amount < Decimal::ZERO || a.spent_amount < Decimal::ZERO {
        return Err(AppError::validation("Amounts cannot be negative"));
    }
    if queries::get_department(&state.db, a.department_id).await?.is_none() {
        return Err(AppError::not_found("Department"));
    }
    fetch_fund(state, a.fund_source_id).await?;
    Ok(())
}

async fn fetch_allocation(state: &AppState, id: i64, fiscal_year: i32) -> AppResult<AllocationDetail> {
    queries::list_allocation_details(&state.db, fiscal_year, None)
        .await?
        .into_iter()
        .find(|a| a.id == id)
        .ok_or_else(|| AppError::not_found("Allocation"))
}

pub async fn list_allocations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<AllocationDetail>>> {
    user.require_admin()?;
    let rows = queries::list_allocation_details(&state.db, state.config.fiscal_year, None).await?;
    Ok(Json(rows))
}

pub async fn create_allocation(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<AllocationInput>,
) -> AppResult<impl IntoResponse> {
    user.require_admin()?;
    validate_allocation(&state, &payload).await?;

    let id = queries::create_allocation(&state.db, &payload).await?;
    audit(
        &state,
        &user,
        "Budget Allocated",
        "budget_allocation",
        format!("#{id} {} {}", payload.category.trim(), payload.allocated_amount),
    )
    .await?;

    let created = fetch_allocation(&state, id, payload.fiscal_year).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_allocation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AllocationInput>,
) -> AppResult<Json<AllocationDetail>> {
    user.require_admin()?;
    validate_allocation(&state, &payload).await?;
    if !queries::update_allocation(&state.db, id, &payload).await? {
        return Err(AppError::not_found("Allocation"));
    }
    audit(&state, &user, "Budget Allocation Updated", "budget_allocation", format!("#{id}")).await?;
    Ok(Json(fetch_allocation(&state, id, payload.fiscal_year).await?))
}

pub async fn delete_allocation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    user.require_admin()?;
    if queries::get_allocation(&state.db, id).await?.is_none() {
        return Err(AppError::not_found("Allocation"));
    }
    if queries::count_transactions_for_allocation(&state.db, id).await? > 0 {
        return Err(AppError::Conflict("Allocation still has transactions".into()));
    }
    queries::delete_allocation(&state.db, id).await?;
    audit(&state, &user, "Budget Allocation Deleted", "budget_allocation", format!("#{id}")).await?;
    Ok(Json(json!({ "id": id, "deleted": true })))
}

/*==========User Management=========== */

pub async fn list_users(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<Vec<Profile>>> {
    user.require_admin()?;
    Ok(Json(queries::list_profiles(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct RoleAssignment {
    pub role: Role,
    #[serde(default, alias = "departmentId")]
    pub department_id: Option<i64>,
}

pub async fn update_user_role(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<RoleAssignment>,
) -> AppResult<Json<Profile>> {
    user.require_admin()?;
    let target = queries::get_profile_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    // super admins are minted and demoted only by a super admin
    let touches_super = payload.role == Role::SuperAdmin || target.role() == Some(Role::SuperAdmin);
    if touches_super && user.role() != Some(Role::SuperAdmin) {
        return Err(AppError::Forbidden("Only a super admin can grant or revoke that role".into()));
    }
    if let Some(dept) = payload.department_id {
        if queries::get_department(&state.db, dept).await?.is_none() {
            return Err(AppError::not_found("Department"));
        }
    }
    if !queries::update_profile_assignment(&state.db, user_id, payload.role.as_str(), payload.department_id).await? {
        return Err(AppError::not_found("User"));
    }
    audit(
        &state,
        &user,
        "Role Changed",
        "profile",
        format!("user #{user_id} -> {}", payload.role.as_str()),
    )
    .await?;

    let profile = queries::get_profile_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(profile))
}
