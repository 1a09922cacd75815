//! Tests for the authenticated payment endpoints.
//!
//! Real provider flows require HTTP mocking, so these cover everything up to
//! the provider API call, plus the full flow through the dev-mode simulation
//! provider (which exercises the same capture -> reconcile path end to end).

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::*;

fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("Response should be valid JSON")
}

#[tokio::test]
async fn test_create_intent_requires_auth() {
    let state = create_test_app_state();
    let app = app(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/payments/mercadopago/create-intent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_intent_rejects_unknown_provider() {
    let state = create_test_app_state();
    let token = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "a@example.com").1
    };

    let response = app(state)
        .oneshot(authed("POST", "/payments/venmo/create-intent", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_intent_unconfigured_provider_is_bad_gateway() {
    let state = create_test_app_state();
    let token = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "b@example.com").1
    };

    let response = app(state)
        .oneshot(authed("POST", "/payments/mercadopago/create-intent", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_create_intent_conflicts_when_already_pro() {
    let state = create_test_app_state();
    let (user, token) = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "pro@example.com")
    };

    {
        let mut conn = state.db.get().unwrap();
        reconcile(&mut conn, &user.id, &mp_record("7001", None)).unwrap();
    }

    let response = app(state)
        .oneshot(authed("POST", "/payments/mercadopago/create-intent", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_simulation_rejected_outside_dev_mode() {
    let mut state = create_test_app_state();
    state.dev_mode = false;
    let token = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "nodev@example.com").1
    };

    let response = app(state)
        .oneshot(authed("POST", "/payments/simulation/create-intent", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_simulation_full_flow_grants_pro_idempotently() {
    let state = create_test_app_state();
    let token = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "flow@example.com").1
    };

    // Create intent
    let response = app(state.clone())
        .oneshot(authed("POST", "/payments/simulation/create-intent", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let intent = body_json(response).await;
    let order_id = intent["provider_order_id"].as_str().unwrap().to_string();
    assert!(order_id.starts_with("sim_"));
    assert!(intent["redirect_url"].as_str().unwrap().contains("/checkout/success"));

    // Capture
    let capture_uri = format!("/payments/simulation/capture/{}", order_id);
    let response = app(state.clone())
        .oneshot(authed("POST", &capture_uri, &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["is_pro"], true);
    assert_eq!(body["already_processed"], false);

    // Capture again: success, no new record
    let response = app(state.clone())
        .oneshot(authed("POST", &capture_uri, &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["is_pro"], true);
    assert_eq!(body["already_processed"], true);

    // Entitlement state and audit log
    let response = app(state.clone())
        .oneshot(authed("GET", "/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let me = body_json(response).await;
    assert_eq!(me["user"]["is_pro"], true);
    assert_eq!(me["payments"].as_array().unwrap().len(), 1);

    // Status endpoint sees the recorded payment
    let payment_id = format!("simpay_{}", order_id);
    let response = app(state.clone())
        .oneshot(authed(
            "GET",
            &format!("/payments/simulation/{}/status", payment_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let status = body_json(response).await;
    assert_eq!(status["is_final_success"], true);
    assert_eq!(status["record"]["payment_id"].as_str().unwrap(), payment_id);
}

#[tokio::test]
async fn test_status_rejects_other_users_payment() {
    let state = create_test_app_state();
    let (owner, owner_token) = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "owner@example.com")
    };
    let other_token = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "other@example.com").1
    };

    // Owner buys via simulation
    let response = app(state.clone())
        .oneshot(authed(
            "POST",
            "/payments/simulation/capture/sim_abc123",
            &owner_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    {
        let conn = state.db.get().unwrap();
        let user = queries::get_user_by_id(&conn, &owner.id).unwrap().unwrap();
        assert!(user.is_pro);
    }

    // A different authenticated user may not read it
    let response = app(state.clone())
        .oneshot(authed(
            "GET",
            "/payments/simulation/simpay_sim_abc123/status",
            &other_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_me_starts_free_with_no_payments() {
    let state = create_test_app_state();
    let token = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "free@example.com").1
    };

    let response = app(state)
        .oneshot(authed("GET", "/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let me = body_json(response).await;
    assert_eq!(me["user"]["is_pro"], false);
    assert_eq!(me["payments"].as_array().unwrap().len(), 0);
}
