//! Test utilities and fixtures for Saludo integration tests

#![allow(dead_code)]

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

pub use saludo::crypto;
pub use saludo::db::{AppState, DbPool, init_db, queries};
pub use saludo::handlers;
pub use saludo::models::*;
pub use saludo::reconcile::{ReconcileOutcome, reconcile};

/// In-memory pool with a single connection so every request sees the same
/// database.
pub fn memory_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    pool
}

/// File-backed pool for tests that exercise real cross-connection
/// concurrency. Returns the path so the caller can clean up.
pub fn temp_file_pool(max_size: u32) -> (DbPool, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("saludo-test-{}.db", uuid::Uuid::new_v4()));
    let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });
    let pool = Pool::builder().max_size(max_size).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    (pool, path)
}

/// AppState with no real provider configured, in dev mode.
pub fn create_test_app_state() -> AppState {
    test_state_with_pool(memory_pool())
}

pub fn test_state_with_pool(pool: DbPool) -> AppState {
    AppState {
        db: pool,
        base_url: "http://localhost:3000".to_string(),
        dev_mode: true,
        pro_price_cents: 500,
        pro_currency: "usd".to_string(),
        mercadopago: None,
        paypal: None,
    }
}

/// Full application router, assembled the way main() does it.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::router(state.clone()))
        .merge(handlers::webhooks::router())
        .with_state(state)
}

/// Create a test user; returns the user and its raw API token.
pub fn create_test_user(conn: &Connection, email: &str) -> (User, String) {
    let token = crypto::generate_token();
    let user = queries::create_user(
        conn,
        &CreateUser {
            email: email.to_string(),
            name: format!("Test User {}", email),
        },
        &crypto::hash_token(&token),
    )
    .expect("Failed to create test user");
    (user, token)
}

/// A MercadoPago-shaped record that already passed the final-success gate.
pub fn mp_record(payment_id: &str, order_id: Option<&str>) -> PaymentRecord {
    PaymentRecord {
        payment_id: payment_id.to_string(),
        provider_order_id: order_id.map(|s| s.to_string()),
        provider: Provider::MercadoPago,
        amount_cents: 500,
        currency: "ars".to_string(),
        status: "approved".to_string(),
        status_detail: Some("accredited".to_string()),
        payment_method: Some("visa".to_string()),
        payment_type: Some("credit_card".to_string()),
        payer_email: Some("payer@example.com".to_string()),
        payer_name: Some("Ana García".to_string()),
        payer_id: Some("42".to_string()),
        approved_at: Some(1_717_243_200),
    }
}

/// A PayPal-shaped record that already passed the final-success gate.
pub fn paypal_record(capture_id: &str, order_id: Option<&str>) -> PaymentRecord {
    PaymentRecord {
        payment_id: capture_id.to_string(),
        provider_order_id: order_id.map(|s| s.to_string()),
        provider: Provider::PayPal,
        amount_cents: 500,
        currency: "usd".to_string(),
        status: "COMPLETED".to_string(),
        status_detail: Some("COMPLETED".to_string()),
        payment_method: Some("paypal".to_string()),
        payment_type: None,
        payer_email: Some("payer@example.com".to_string()),
        payer_name: Some("Ana García".to_string()),
        payer_id: Some("PAYER1".to_string()),
        approved_at: Some(1_717_243_200),
    }
}
