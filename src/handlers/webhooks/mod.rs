pub mod common;
pub mod mercadopago;
pub mod paypal;

pub use mercadopago::handle_mercadopago_webhook;
pub use paypal::handle_paypal_webhook;

use axum::{Router, routing::post};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhooks/mercadopago", post(handle_mercadopago_webhook))
        .route("/webhooks/paypal", post(handle_paypal_webhook))
}
