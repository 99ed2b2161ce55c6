mod common;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use finance_transparency::backend::handlers::{self, ChatRequest};
use finance_transparency::chat::{self, FALLBACK_REPLY, PROMPT_REQUIRED};
use finance_transparency::error::AppError;
use finance_transparency::reports::{self, ReportRequest};
use finance_transparency::transparency::PortalSettings;
use rust_decimal::Decimal;
use serde_json::json;

fn report_request(value: serde_json::Value) -> ReportRequest {
    serde_json::from_value(value).expect("valid report request")
}

fn settings() -> PortalSettings {
    PortalSettings { fiscal_year: 2024, usd_rate: Decimal::new(12, 3) }
}

#[tokio::test]
async fn generated_report_is_stored_and_downloadable_by_its_owner() {
    let pool = common::seeded_pool().await;
    let head = common::sign_in_as(&pool, "cs.head@acear.edu").await;

    let req = report_request(json!({
        "reportType": "budget_summary",
        "departments": ["CS"],
        "format": "csv"
    }));
    let generated = reports::generate(&pool, &head, 2024, req).await.unwrap();
    assert_eq!(generated.status, "completed");
    assert!(generated.download_url.starts_with("/api/reports/download/"));

    let file = reports::download(&pool, &head, &generated.id).await.unwrap();
    assert!(file.file_name.ends_with(".csv"));
    let lines: Vec<&str> = file.content.lines().collect();
    // header, two CS allocations, four summary records
    assert_eq!(lines.len(), 1 + 2 + 4);
    assert!(lines[0].starts_with("\"Department\",\"Code\""));
    assert!(lines[1..3].iter().all(|l| l.contains("\"CS\"")));
    assert_eq!(lines[3], "\"Total allocated\",\"2000000\"");

    let auditor = common::sign_in_as(&pool, "auditor@acear.edu").await;
    assert!(reports::download(&pool, &auditor, &generated.id).await.is_ok());

    let student = common::sign_in_as(&pool, "student@acear.edu").await;
    let err = reports::download(&pool, &student, &generated.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let logs = finance_transparency::database::db::queries::list_audit_logs(&pool, 1).await.unwrap();
    assert_eq!(logs[0].action, "Report Generated");
}

async fn csv_report(pool: &sqlx::Pool<sqlx::Sqlite>, email: &str, report_type: &str) -> String {
    let user = common::sign_in_as(pool, email).await;
    let req = report_request(json!({ "reportType": report_type, "format": "csv" }));
    let generated = reports::generate(pool, &user, 2024, req).await.unwrap();
    reports::download(pool, &user, &generated.id).await.unwrap().content
}

#[tokio::test]
async fn reports_only_cover_what_the_caller_may_browse() {
    let pool = common::seeded_pool().await;

    let faculty_spend = csv_report(&pool, "faculty@acear.edu", "spending_analysis").await;
    assert!(faculty_spend.contains("\"Transactions\",\"3\""));
    assert!(!faculty_spend.contains("EduSoft"));

    let admin_spend = csv_report(&pool, "admin@acear.edu", "spending_analysis").await;
    assert!(admin_spend.contains("\"Transactions\",\"12\""));

    let faculty_budget = csv_report(&pool, "faculty@acear.edu", "budget_summary").await;
    let rows: Vec<&str> = faculty_budget.lines().skip(1).take_while(|l| l.contains("\"CS\"")).collect();
    assert_eq!(rows.len(), 2);
    assert!(faculty_budget.contains("\"Total allocated\",\"2000000\""));

    let student_budget = csv_report(&pool, "student@acear.edu", "budget_summary").await;
    assert!(student_budget.contains("\"Total allocated\",\"8400000\""));
}

#[tokio::test]
async fn text_reports_carry_a_title_and_summary() {
    let pool = common::seeded_pool().await;
    let admin = common::sign_in_as(&pool, "admin@acear.edu").await;

    let generated = reports::generate(&pool, &admin, 2024, report_request(json!({ "reportType": "department_performance" })))
        .await
        .unwrap();
    let file = reports::download(&pool, &admin, &generated.id).await.unwrap();
    assert!(file.file_name.ends_with(".txt"));
    assert!(file.content.starts_with("Financial Report: Department Performance"));
    assert!(file.content.contains("Computer Science"));
}

#[tokio::test]
async fn unsupported_formats_and_restricted_types_are_refused() {
    let pool = common::seeded_pool().await;
    let student = common::sign_in_as(&pool, "student@acear.edu").await;

    let err = reports::generate(&pool, &student, 2024, report_request(json!({ "reportType": "budget_summary", "format": "pdf" })))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = reports::generate(&pool, &student, 2024, report_request(json!({ "reportType": "compliance_audit" })))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = reports::generate(&pool, &student, 2024, report_request(json!({ "reportType": "horoscope" })))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn prebuilt_catalog_respects_access_lists() {
    let everything = reports::prebuilt_catalog(Some("financial_admin"));
    let public_only = reports::prebuilt_catalog(None);
    assert!(public_only.len() < everything.len());
    assert!(public_only.iter().all(|r| r.access.contains(&"public")));
}

#[tokio::test]
async fn funding_questions_are_answered_from_the_store() {
    let pool = common::seeded_pool().await;
    let provider = common::MockChat::replying("should not be used");

    let text = chat::answer(&pool, &provider, settings(), "What is the budget for Computer Science?")
        .await
        .unwrap();
    assert_eq!(
        text,
        "The current funding portfolio for the Computer Science department is as follows:\n\nAllocated: $2,000,000\nSpent: $1,500,000\nDescription: Department of Computer Science and Engineering."
    );
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn other_questions_go_to_the_provider() {
    let pool = common::seeded_pool().await;

    let provider = common::MockChat::replying("Admissions open in June.");
    let text = chat::answer(&pool, &provider, settings(), "When do admissions open?").await.unwrap();
    assert_eq!(text, "Admissions open in June.");
    assert_eq!(provider.call_count(), 1);

    let silent = common::MockChat::empty();
    let text = chat::answer(&pool, &silent, settings(), "Hello?").await.unwrap();
    assert_eq!(text, FALLBACK_REPLY);

    let broken = common::MockChat::failing("rate limited");
    let err = chat::answer(&pool, &broken, settings(), "Hello?").await.unwrap_err();
    assert!(matches!(&err, AppError::Upstream(m) if m == "rate limited"));
}

#[tokio::test]
async fn blank_prompt_is_a_bad_request() {
    let pool = common::seeded_pool().await;
    let state = common::app_state(pool, Arc::new(common::MockChat::empty()));

    let response = handlers::chat(State(state), Json(ChatRequest { prompt: Some("   ".into()) }))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&common::body_text(response).await).unwrap();
    assert_eq!(body, json!({ "error": PROMPT_REQUIRED }));
}
