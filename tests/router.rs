mod common;

use std::sync::Arc;

use finance_transparency::auth;
use finance_transparency::backend::build_router;
use finance_transparency::database::db::seed;
use reqwest::{header, StatusCode};
use sqlx::{Pool, Sqlite};

async fn serve(pool: Pool<Sqlite>) -> String {
    let app = build_router(common::app_state(pool, Arc::new(common::MockChat::empty())));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{addr}")
}

fn assert_not_cached(response: &reqwest::Response) {
    let headers = response.headers();
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-store, must-revalidate");
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");
}

#[tokio::test]
async fn private_routes_require_a_live_session() {
    let pool = common::seeded_pool().await;
    let base = serve(pool.clone()).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/api/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_not_cached(&response);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Unauthorized" }));

    let outcome = auth::sign_in(&pool, true, 24, "cs.head@acear.edu", seed::DEMO_PASSWORD).await.unwrap();
    let response = client
        .get(format!("{base}/api/dashboard"))
        .bearer_auth(&outcome.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_not_cached(&response);

    let response = client
        .post(format!("{base}/auth/logout"))
        .bearer_auth(&outcome.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{base}/api/dashboard"))
        .bearer_auth(&outcome.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_cookie_is_accepted_in_place_of_a_bearer_token() {
    let pool = common::seeded_pool().await;
    let base = serve(pool.clone()).await;

    let outcome = auth::sign_in(&pool, true, 24, "auditor@acear.edu", seed::DEMO_PASSWORD).await.unwrap();
    let response = reqwest::Client::new()
        .get(format!("{base}/auth/me"))
        .header(header::COOKIE, format!("{}={}", auth::session::SESSION_COOKIE, outcome.token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_and_public_pages_skip_the_session_layer() {
    let pool = common::seeded_pool().await;
    let base = serve(pool).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::PRAGMA).is_none());
    assert_eq!(response.text().await.unwrap(), "Backend is running");

    let response = client.get(format!("{base}/public/stats")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
