use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::analytics::TrendPoint;
use crate::backend::AppState;
use crate::currency::Currency;
use crate::error::AppResult;
use crate::transparency::{self, FundSummary, PortalOverview, PortalQuery, PortalStats, PublicDepartment};

#[derive(Debug, Default, Deserialize)]
pub struct CurrencyQuery {
    #[serde(default)]
    pub currency: Currency,
}

pub async fn public_transparency(
    State(state): State<AppState>,
    Query(q): Query<PortalQuery>,
) -> AppResult<Json<PortalOverview>> {
    Ok(Json(transparency::overview(&state.db, state.portal_settings(), &q).await?))
}

pub async fn public_departments(
    State(state): State<AppState>,
    Query(q): Query<PortalQuery>,
) -> AppResult<Json<Vec<PublicDepartment>>> {
    Ok(Json(transparency::public_departments(&state.db, state.portal_settings(), &q).await?))
}

pub async fn public_fund_sources(
    State(state): State<AppState>,
    Query(q): Query<CurrencyQuery>,
) -> AppResult<Json<FundSummary>> {
    Ok(Json(transparency::fund_sources(&state.db, state.portal_settings(), q.currency).await?))
}

pub async fn public_spending_trends(
    State(state): State<AppState>,
    Query(q): Query<CurrencyQuery>,
) -> AppResult<Json<Vec<TrendPoint>>> {
    Ok(Json(transparency::spending_trends(&state.db, state.portal_settings(), q.currency).await?))
}

pub async fn public_stats(
    State(state): State<AppState>,
    Query(q): Query<PortalQuery>,
) -> AppResult<Json<PortalStats>> {
    Ok(Json(transparency::stats(&state.db, state.portal_settings(), &q).await?))
}
