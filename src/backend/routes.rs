use axum::{
    routing::{get, patch, post, put},
    Router,
};
use crate::backend::{self, handlers, AppState};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/public/transparency", get(backend::public_transparency))
        .route("/public/departments", get(backend::public_departments))
        .route("/public/fund-sources", get(backend::public_fund_sources))
        .route("/public/spending-trends", get(backend::public_spending_trends))
        .route("/public/stats", get(backend::public_stats))
        .route("/api/chat", post(handlers::chat))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(backend::signup))
        .route("/auth/login", post(backend::login))
        .route("/auth/verify", post(backend::verify))
        .route("/auth/logout", post(backend::logout))
        .route("/auth/role", post(backend::select_role))
        .route("/auth/me", get(backend::me))
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/analytics", get(handlers::analytics))
        .route("/api/transactions", get(handlers::list_transactions).post(handlers::create_transaction))
        .route("/api/transactions/export", get(handlers::export_transactions))
        .route("/api/transactions/filters", get(handlers::transaction_filters))
        .route("/api/transactions/:id/status", patch(handlers::update_transaction_status))
        .route("/api/alerts", get(handlers::list_alerts))
        .route("/api/alerts/:id/resolve", post(handlers::resolve_alert))
        .route("/api/audit-logs", get(handlers::list_audit_logs))
        .route("/api/departments", get(handlers::list_departments).post(handlers::create_department))
        .route("/api/admin/funds", get(backend::list_funds).post(backend::create_fund))
        .route("/api/admin/funds/:id", put(backend::update_fund).delete(backend::delete_fund))
        .route(
            "/api/admin/allocations",
            get(backend::list_allocations).post(backend::create_allocation),
        )
        .route(
            "/api/admin/allocations/:id",
            put(backend::update_allocation).delete(backend::delete_allocation),
        )
        .route("/api/admin/users", get(backend::list_users))
        .route("/api/admin/users/:id/role", patch(backend::update_user_role))
        .route("/api/reports/generate", post(handlers::generate_report))
        .route("/api/reports/download/:id", get(handlers::download_report))
        .route("/api/reports/prebuilt", get(handlers::prebuilt_reports))
}
