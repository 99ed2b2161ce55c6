use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Sqlite};
use tracing::debug;

use crate::auth::password::{new_token, token_digest};
use crate::auth::Role;
use crate::config::MAX_SESSION_TTL_HOURS;
use crate::database::db::queries::{self, TxnScope};
use crate::database::models::Profile;
use crate::error::{AppError, AppResult};

pub const SESSION_COOKIE: &str = "session";

/// How much of the institution's budget detail a caller may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetReach {
    Institution,
    Department(i64),
    /// department staff with no department assigned
    Nothing,
}

/// The signed-in caller, resolved from a session token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i64,
    pub email: String,
    pub profile: Profile,
}

impl CurrentUser {
    pub fn role(&self) -> Option<Role> {
        self.profile.role()
    }

    pub fn is_admin(&self) -> bool {
        self.profile.is_admin()
    }

    pub fn has_any(&self, roles: &[Role]) -> bool {
        self.role().map(|r| roles.contains(&r)).unwrap_or(false)
    }

    /// Transactions this caller may browse. Department heads see their
    /// department; faculty, staff and unassigned heads see their own submissions.
    pub fn transaction_scope(&self) -> TxnScope {
        match (self.role(), self.profile.department_id) {
            (Some(Role::DepartmentHead), Some(dept)) => TxnScope::Department(dept),
            (Some(Role::DepartmentHead | Role::Faculty | Role::Staff), _) => TxnScope::CreatedBy(self.user_id),
            _ => TxnScope::All,
        }
    }

    /// Allocation detail: department roles are held to their own department.
    pub fn budget_reach(&self) -> BudgetReach {
        match (self.role(), self.profile.department_id) {
            (Some(Role::DepartmentHead | Role::Faculty | Role::Staff), Some(dept)) => BudgetReach::Department(dept),
            (Some(Role::DepartmentHead | Role::Faculty | Role::Staff), None) => BudgetReach::Nothing,
            _ => BudgetReach::Institution,
        }
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator access required".into()))
        }
    }

    pub fn require_any(&self, roles: &[Role]) -> AppResult<()> {
        if self.has_any(roles) {
            Ok(())
        } else {
            Err(AppError::Forbidden("You do not have access to this resource".into()))
        }
    }
}

pub async fn create_session(
    pool: &Pool<Sqlite>,
    user_id: i64,
    ttl_hours: i64,
) -> AppResult<(String, DateTime<Utc>)> {
    let token = new_token();
    let expires_at = Utc::now() + Duration::hours(ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS));
    queries::insert_session(pool, &token_digest(&token), user_id, expires_at).await?;
    Ok((token, expires_at))
}

pub async fn authenticate(pool: &Pool<Sqlite>, token: &str) -> AppResult<CurrentUser> {
    let unauthorized = || AppError::Unauthorized("Unauthorized".into());
    let digest = token_digest(token);

    let (user_id, expires_at) = queries::find_session(pool, &digest)
        .await?
        .ok_or_else(unauthorized)?;

    if expires_at <= Utc::now() {
        debug!(user_id, "session expired");
        queries::delete_session(pool, &digest).await?;
        return Err(unauthorized());
    }

    let user = queries::get_user(pool, user_id).await?.ok_or_else(unauthorized)?;
    let profile = queries::get_profile_by_user(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Profile"))?;

    Ok(CurrentUser {
        user_id,
        email: user.email,
        profile,
    })
}

pub async fn sign_out(pool: &Pool<Sqlite>, token: &str) -> AppResult<()> {
    queries::delete_session(pool, &token_digest(token)).await?;
    Ok(())
}

/// Bearer header first, then the `session` cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn caller(role: Option<&str>, department_id: Option<i64>) -> CurrentUser {
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
    fn browsing_scope_follows_role() {
        assert_eq!(caller(Some("department_head"), Some(3)).transaction_scope(), TxnScope::Department(3));
        assert_eq!(caller(Some("department_head"), None).transaction_scope(), TxnScope::CreatedBy(7));
        assert_eq!(caller(Some("faculty"), Some(1)).transaction_scope(), TxnScope::CreatedBy(7));
        assert_eq!(caller(Some("auditor"), None).transaction_scope(), TxnScope::All);
        assert_eq!(caller(None, None).transaction_scope(), TxnScope::All);
    }

    #[test]
    fn department_roles_are_held_to_their_department_budget() {
        assert_eq!(caller(Some("staff"), Some(2)).budget_reach(), BudgetReach::Department(2));
        assert_eq!(caller(Some("faculty"), None).budget_reach(), BudgetReach::Nothing);
        assert_eq!(caller(Some("student"), None).budget_reach(), BudgetReach::Institution);
        assert_eq!(caller(Some("financial_admin"), None).budget_reach(), BudgetReach::Institution);
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=def"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=xyz"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn missing_token_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert!(token_from_headers(&headers).is_none());
    }
}
