pub mod checkout;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::db::AppState;
use crate::middleware::user_auth;

/// Authenticated payment endpoints.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/payments/{provider}/create-intent",
            post(checkout::create_intent),
        )
        .route(
            "/payments/{provider}/capture/{order_id}",
            post(checkout::capture_payment),
        )
        .route(
            "/payments/{provider}/{payment_id}/status",
            get(checkout::payment_status),
        )
        .route("/me", get(checkout::me))
        .route_layer(axum::middleware::from_fn_with_state(state, user_auth))
}
