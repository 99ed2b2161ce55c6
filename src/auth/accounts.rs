use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info, warn};

use crate::auth::password::{hash_password, new_salt, new_token, verify_password};
use crate::auth::session::{create_session, CurrentUser};
use crate::auth::validation::{self, validate_sign_up};
use crate::auth::{redirect_target, Role};
use crate::database::db::queries::{self, NewUserRecord};
use crate::database::models::{NewAuditLog, Profile};
use crate::error::{AppError, AppResult};

/// Self-registration payload. Role and department are never taken from here;
/// the staff-type prompt or an administrator sets them later.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "confirmPassword")]
    pub confirm_password: String,
    #[serde(default, alias = "fullName")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpOutcome {
    pub user_id: i64,
    pub email: String,
    pub requires_verification: bool,
    // handed to the mail relay; exposed here because no relay ships with the service
    pub verification_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInOutcome {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub profile: Profile,
    pub needs_role: bool,
    pub redirect: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleChoice {
    pub role: Role,
    pub redirect: String,
}

/// Roles a user may pick for themselves at the staff-type prompt.
pub const SELF_SERVICE_ROLES: [Role; 4] = [Role::Staff, Role::Faculty, Role::Student, Role::Parent];

pub async fn sign_up(
    pool: &Pool<Sqlite>,
    require_verification: bool,
    req: SignUpRequest,
) -> AppResult<SignUpOutcome> {
    validate_sign_up(&req.email, &req.password, &req.confirm_password)
        .map_err(AppError::validation)?;

    let email = req.email.trim().to_lowercase();
    if queries::find_user_by_email(pool, &email).await?.is_some() {
        return Err(AppError::Conflict(validation::EMAIL_TAKEN.into()));
    }

    let salt = new_salt();
    let hash = hash_password(&req.password, &salt)?;
    let token = require_verification.then(new_token);
    let full_name = req.full_name.unwrap_or_default();

    let user_id = queries::create_user_with_profile(
        pool,
        &NewUserRecord {
            email: &email,
            password_hash: &hash,
            password_salt: &salt,
            verification_token: token.as_deref(),
            confirmed: !require_verification,
            full_name: full_name.trim(),
            role: None,
            department_id: None,
        },
    )
    .await
    .map_err(|e| match e {
        // lost a race with a concurrent sign-up for the same address
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(validation::EMAIL_TAKEN.into())
        }
        other => AppError::Database(other),
    })?;

    queries::append_audit(
        pool,
        &NewAuditLog::info(Some(&email), "User Registered", "user", format!("user #{user_id}")),
    )
    .await?;

    if let Some(t) = &token {
        debug!(%email, verification_token = %t, "verification token issued");
    }
    info!(user_id, %email, "account created");

    Ok(SignUpOutcome {
        user_id,
        email,
        requires_verification: require_verification,
        verification_token: token,
    })
}

pub async fn verify_email(pool: &Pool<Sqlite>, token: &str) -> AppResult<()> {
    if token.trim().is_empty() || !queries::verify_user_email(pool, token.trim()).await? {
        return Err(AppError::not_found("Verification token"));
    }
    Ok(())
}

pub async fn sign_in(
    pool: &Pool<Sqlite>,
    require_verification: bool,
    ttl_hours: i64,
    email: &str,
    password: &str,
) -> AppResult<SignInOutcome> {
    let invalid = || AppError::Unauthorized(validation::INVALID_CREDENTIALS.into());

    let user = queries::find_user_by_email(pool, email).await?.ok_or_else(invalid)?;
    if !verify_password(password, &user.password_salt, &user.password_hash)? {
        warn!(email = %user.email, "failed login");
        return Err(invalid());
    }
    if require_verification && !user.is_verified() {
        return Err(AppError::Forbidden(validation::EMAIL_NOT_VERIFIED.into()));
    }

    let profile = queries::get_profile_by_user(pool, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Profile"))?;
    let (token, expires_at) = create_session(pool, user.id, ttl_hours).await?;

    let role = profile.role();
    let redirect = role.map(redirect_target).unwrap_or("/dashboard").to_string();
    info!(user_id = user.id, role = ?role, "signed in");

    Ok(SignInOutcome {
        token,
        expires_at,
        needs_role: role.is_none(),
        profile,
        redirect,
    })
}

/// Staff-type prompt shown after login, answerable once while the profile has no role.
pub async fn choose_role(
    pool: &Pool<Sqlite>,
    user: &CurrentUser,
    staff_type: &str,
) -> AppResult<RoleChoice> {
    if user.profile.role.is_some() {
        return Err(AppError::Conflict(validation::ROLE_ALREADY_SET.into()));
    }
    if staff_type.trim().is_empty() {
        return Err(AppError::validation(validation::STAFF_TYPE_REQUIRED));
    }
    let role: Role = staff_type.parse().map_err(AppError::Validation)?;
    if !SELF_SERVICE_ROLES.contains(&role) {
        return Err(AppError::Forbidden(validation::ROLE_NEEDS_ADMIN.into()));
    }

    queries::set_profile_role(pool, user.user_id, role.as_str()).await?;
    queries::append_audit(
        pool,
        &NewAuditLog::info(Some(&user.email), "Role Selected", "profile", role.as_str()),
    )
    .await?;

    Ok(RoleChoice {
        role,
        redirect: redirect_target(role).to_string(),
    })
}
