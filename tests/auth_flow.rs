mod common;

use finance_transparency::auth::{self, validation, SignUpRequest};
use finance_transparency::database::db::queries;
use finance_transparency::error::AppError;

fn request(email: &str, password: &str, confirm: &str) -> SignUpRequest {
    SignUpRequest {
        email: email.to_string(),
        password: password.to_string(),
        confirm_password: confirm.to_string(),
        full_name: Some("New Person".to_string()),
    }
}

#[tokio::test]
async fn mismatched_passwords_create_no_user() {
    let pool = common::empty_pool().await;

    let err = auth::sign_up(&pool, true, request("new@acear.edu", "secret1", "secret2"))
        .await
        .unwrap_err();

    assert!(matches!(&err, AppError::Validation(m) if m == validation::PASSWORDS_DO_NOT_MATCH));
    assert!(queries::find_user_by_email(&pool, "new@acear.edu").await.unwrap().is_none());
    assert!(queries::list_audit_logs(&pool, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn unverified_accounts_cannot_sign_in_until_verified() {
    let pool = common::empty_pool().await;

    let outcome = auth::sign_up(&pool, true, request("New@Acear.edu", "secret1", "secret1"))
        .await
        .unwrap();
    assert_eq!(outcome.email, "new@acear.edu");
    assert!(outcome.requires_verification);

    let err = auth::sign_in(&pool, true, 24, "new@acear.edu", "secret1").await.unwrap_err();
    assert!(matches!(&err, AppError::Forbidden(m) if m == validation::EMAIL_NOT_VERIFIED));

    let token = outcome.verification_token.expect("token issued");
    auth::verify_email(&pool, &token).await.unwrap();

    let signed_in = auth::sign_in(&pool, true, 24, "new@acear.edu", "secret1").await.unwrap();
    assert!(signed_in.needs_role);
    assert_eq!(signed_in.redirect, "/dashboard");
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let pool = common::empty_pool().await;
    auth::sign_up(&pool, false, request("dup@acear.edu", "secret1", "secret1")).await.unwrap();

    let err = auth::sign_up(&pool, false, request("DUP@acear.edu", "secret1", "secret1"))
        .await
        .unwrap_err();
    assert!(matches!(&err, AppError::Conflict(m) if m == validation::EMAIL_TAKEN));
}

#[tokio::test]
async fn wrong_password_and_unknown_token_are_rejected() {
    let pool = common::seeded_pool().await;

    let err = auth::sign_in(&pool, true, 24, "admin@acear.edu", "nope-nope").await.unwrap_err();
    assert!(matches!(&err, AppError::Unauthorized(m) if m == validation::INVALID_CREDENTIALS));

    let err = auth::verify_email(&pool, "not-a-token").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn staff_type_prompt_sets_role_but_never_an_admin_one() {
    let pool = common::empty_pool().await;
    auth::sign_up(&pool, false, request("staff@acear.edu", "secret1", "secret1")).await.unwrap();
    let session = auth::sign_in(&pool, false, 24, "staff@acear.edu", "secret1").await.unwrap();
    let user = auth::authenticate(&pool, &session.token).await.unwrap();

    let err = auth::choose_role(&pool, &user, "").await.unwrap_err();
    assert!(matches!(&err, AppError::Validation(m) if m == validation::STAFF_TYPE_REQUIRED));

    let err = auth::choose_role(&pool, &user, "financial_admin").await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let choice = auth::choose_role(&pool, &user, "staff").await.unwrap();
    assert_eq!(choice.redirect, "/staff-dash");

    let refreshed = auth::authenticate(&pool, &session.token).await.unwrap();
    assert_eq!(refreshed.profile.role.as_deref(), Some("staff"));
}

#[tokio::test]
async fn sign_up_ignores_a_requested_role_and_department() {
    let pool = common::seeded_pool().await;
    let lib = queries::get_department_by_code(&pool, "LIB").await.unwrap().unwrap();

    let req: SignUpRequest = serde_json::from_value(serde_json::json!({
        "email": "climber@acear.edu",
        "password": "secret1",
        "confirmPassword": "secret1",
        "role": "department_head",
        "departmentId": lib.id,
    }))
    .unwrap();
    let outcome = auth::sign_up(&pool, false, req).await.unwrap();

    let profile = queries::get_profile_by_user(&pool, outcome.user_id).await.unwrap().unwrap();
    assert!(profile.role.is_none());
    assert!(profile.department_id.is_none());

    let session = auth::sign_in(&pool, false, 24, "climber@acear.edu", "secret1").await.unwrap();
    assert!(session.needs_role);
    let user = auth::authenticate(&pool, &session.token).await.unwrap();
    let err = auth::choose_role(&pool, &user, "department_head").await.unwrap_err();
    assert!(matches!(&err, AppError::Forbidden(m) if m == validation::ROLE_NEEDS_ADMIN));
}

#[tokio::test]
async fn a_role_once_set_cannot_be_re_chosen() {
    let pool = common::seeded_pool().await;

    let faculty = common::sign_in_as(&pool, "faculty@acear.edu").await;
    let err = auth::choose_role(&pool, &faculty, "department_head").await.unwrap_err();
    assert!(matches!(&err, AppError::Conflict(m) if m == validation::ROLE_ALREADY_SET));

    auth::sign_up(&pool, false, request("fresh@acear.edu", "secret1", "secret1")).await.unwrap();
    let session = auth::sign_in(&pool, false, 24, "fresh@acear.edu", "secret1").await.unwrap();
    let user = auth::authenticate(&pool, &session.token).await.unwrap();
    auth::choose_role(&pool, &user, "faculty").await.unwrap();

    let user = auth::authenticate(&pool, &session.token).await.unwrap();
    let err = auth::choose_role(&pool, &user, "staff").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(user.profile.role.as_deref(), Some("faculty"));
}

#[tokio::test]
async fn signing_out_ends_the_session() {
    let pool = common::seeded_pool().await;
    let session = auth::sign_in(&pool, true, 24, "student@acear.edu", "demo1234").await.unwrap();
    assert!(!session.needs_role);

    auth::sign_out(&pool, &session.token).await.unwrap();
    let err = auth::authenticate(&pool, &session.token).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}
