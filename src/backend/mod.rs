mod account;
mod admin;
pub mod extract;
pub mod handlers;
mod public;
mod routes;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use sqlx::{Pool, Sqlite};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::chat::{ChatProvider, OpenAiCompatProvider};
use crate::config::AppConfig;
use crate::transparency::PortalSettings;

pub use account::{login, logout, me, select_role, signup, verify};
pub use admin::{
    create_allocation, create_fund, delete_allocation, delete_fund, list_allocations, list_funds,
    list_users, update_allocation, update_fund, update_user_role, RoleAssignment,
};
pub use public::{
    public_departments, public_fund_sources, public_spending_trends, public_stats,
    public_transparency,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub config: Arc<AppConfig>,
    pub chat: Arc<dyn ChatProvider>,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, config: AppConfig, chat: Arc<dyn ChatProvider>) -> Self {
        Self { db, config: Arc::new(config), chat }
    }

    pub fn portal_settings(&self) -> PortalSettings {
        PortalSettings {
            fiscal_year: self.config.fiscal_year,
            usd_rate: self.config.usd_conversion_rate,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // signed-in responses must never be cached by the browser
    let private = routes::api_routes()
        .merge(routes::auth_routes())
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ));

    Router::new()
        .route("/health", get(|| async { "Backend is running" }))
        .merge(routes::public_routes())
        .merge(private)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(pool: Pool<Sqlite>, config: AppConfig) -> anyhow::Result<()> {
    let chat = OpenAiCompatProvider::new(config.llm.clone())?;
    let addr = config.bind_addr;
    let app = build_router(AppState::new(pool, config, Arc::new(chat)));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
