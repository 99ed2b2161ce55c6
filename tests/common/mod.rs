#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use finance_transparency::auth::{self, CurrentUser};
use finance_transparency::backend::AppState;
use finance_transparency::chat::{ChatError, ChatProvider};
use finance_transparency::config::AppConfig;
use finance_transparency::database::db::{connection, migrate, seed};
use sqlx::{Pool, Sqlite};

pub async fn empty_pool() -> Pool<Sqlite> {
    let pool = connection::memory_pool().await.expect("memory pool");
    migrate::run_migrations(&pool).await.expect("migrations");
    pool
}

pub async fn seeded_pool() -> Pool<Sqlite> {
    let pool = empty_pool().await;
    assert!(seed::seed_demo_data(&pool).await.expect("seed"));
    pool
}

pub async fn sign_in_as(pool: &Pool<Sqlite>, email: &str) -> CurrentUser {
    let outcome = auth::sign_in(pool, true, 24, email, seed::DEMO_PASSWORD)
        .await
        .expect("demo sign in");
    auth::authenticate(pool, &outcome.token).await.expect("session")
}

/// Scripted provider that counts how often it was asked.
pub struct MockChat {
    pub reply: Result<Option<String>, String>,
    pub calls: AtomicUsize,
}

impl MockChat {
    pub fn replying(text: &str) -> Self {
        Self { reply: Ok(Some(text.to_string())), calls: AtomicUsize::new(0) }
    }

    pub fn empty() -> Self {
        Self { reply: Ok(None), calls: AtomicUsize::new(0) }
    }

    pub fn failing(msg: &str) -> Self {
        Self { reply: Err(msg.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for MockChat {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<Option<String>, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(ChatError::Api)
    }
}

pub fn app_state(pool: Pool<Sqlite>, chat: Arc<dyn ChatProvider>) -> AppState {
    let config = AppConfig { fiscal_year: seed::DEMO_FISCAL_YEAR, ..AppConfig::default() };
    AppState::new(pool, config, chat)
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}
