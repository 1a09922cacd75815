use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::db::AppState;
use crate::payments::{PayPalWebhookEvent, paypal};

use super::common::apply_final_payment;

/// Axum handler for PayPal webhooks.
///
/// Acknowledges unconditionally and immediately; signature verification and
/// reconciliation run in a spawned task. An unverifiable callback is a hard
/// reject: it is logged and dropped, never processed.
pub async fn handle_paypal_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    tokio::spawn(process_webhook(state, headers, body));
    (StatusCode::OK, "OK")
}

async fn process_webhook(state: AppState, headers: HeaderMap, body: Bytes) {
    let Some(client) = state.paypal.clone() else {
        tracing::warn!("PayPal webhook received but provider is not configured");
        return;
    };

    // A callback missing any transmission header can never verify; drop it
    // before spending an API call.
    let Some(verification) = paypal::extract_verification_headers(&headers) else {
        tracing::warn!("PayPal webhook discarded: missing transmission headers");
        return;
    };

    match client.verify_webhook_signature(&verification, &body).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("PayPal webhook discarded: signature verification failed");
            return;
        }
        Err(e) => {
            tracing::error!("PayPal webhook verification error: {}", e);
            return;
        }
    }

    let resource = match paypal::parse_webhook_event(&body) {
        PayPalWebhookEvent::CaptureCompleted(resource) => resource,
        PayPalWebhookEvent::Ignored => {
            tracing::debug!("PayPal webhook ignored");
            return;
        }
    };

    // The embedded capture is used opportunistically when it is
    // self-sufficient; otherwise fall back to fetching the order.
    if let Some((user_id, record)) = paypal::record_from_capture(&resource) {
        apply_final_payment(&state, &user_id, record).await;
        return;
    }

    let Some(order_id) = resource.order_id().map(|s| s.to_string()) else {
        tracing::error!(
            "PayPal capture {} has neither attribution nor a related order id",
            resource.id
        );
        return;
    };

    let order = match client.get_order_with_retry(&order_id).await {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!("PayPal order {} lookup failed: {}", order_id, e);
            return;
        }
    };

    if !paypal::is_final_success(&order) {
        tracing::info!("PayPal order {} not final: status={}", order_id, order.status);
        return;
    }

    match paypal::attributed_user(&order) {
        Some(user_id) => {
            apply_final_payment(&state, &user_id, paypal::normalize(&order)).await;
        }
        None => {
            tracing::error!(
                "PayPal order {} carries no custom_id - cannot attribute",
                order_id
            );
        }
    }
}
