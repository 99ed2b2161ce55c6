use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{
    self, dashboard_for, session::SESSION_COOKIE, CurrentUser, DashboardKind, SignUpRequest,
};
use crate::backend::AppState;
use crate::database::models::Profile;
use crate::error::AppResult;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    #[serde(default, alias = "staffType")]
    pub staff_type: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: i64,
    pub email: String,
    pub profile: Profile,
    pub dashboard: DashboardKind,
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}")
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = auth::sign_up(&state.db, state.config.require_email_verification, req).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = auth::sign_in(
        &state.db,
        state.config.require_email_verification,
        state.config.session_ttl_hours,
        &req.email,
        &req.password,
    )
    .await?;
    let max_age = (outcome.expires_at - Utc::now()).num_seconds().max(0);
    let cookie = session_cookie(&outcome.token, max_age);
    Ok(([(header::SET_COOKIE, cookie)], Json(outcome)))
}

pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> AppResult<impl IntoResponse> {
    auth::verify_email(&state.db, &req.token).await?;
    Ok(Json(json!({ "verified": true })))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    if let Some(token) = auth::token_from_headers(&headers) {
        auth::sign_out(&state.db, &token).await?;
    }
    Ok(([(header::SET_COOKIE, session_cookie("", 0))], Json(json!({ "signed_out": true }))))
}

pub async fn select_role(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<RoleRequest>,
) -> AppResult<impl IntoResponse> {
    let choice = auth::choose_role(&state.db, &user, &req.staff_type).await?;
    Ok(Json(choice))
}

pub async fn me(user: CurrentUser) -> Json<MeResponse> {
    let dashboard = dashboard_for(user.profile.role.as_deref());
    Json(MeResponse {
        user_id: user.user_id,
        email: user.email,
        profile: user.profile,
        dashboard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_carries_lifetime_and_flags() {
        assert_eq!(
            session_cookie("abc", 3600),
            "session=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600"
        );
    }
}
