use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::db::AppState;
use crate::extractors::Query;
use crate::payments::{MercadoPagoClient, MpWebhookEvent, mercadopago};

use super::common::apply_final_payment;

/// Axum handler for MercadoPago webhooks.
///
/// Accepts both the JSON body event shape and the legacy IPN query-string
/// shape. Acknowledges immediately; verification and reconciliation run in a
/// spawned task. The embedded payload is never trusted for payment status -
/// the authoritative state is always re-fetched.
pub async fn handle_mercadopago_webhook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    match mercadopago::parse_webhook_event(&params, &body) {
        MpWebhookEvent::Ignored => (StatusCode::OK, "Event ignored"),
        MpWebhookEvent::PaymentUpdated { payment_id } => {
            tokio::spawn(process_payment_event(state, headers, payment_id));
            (StatusCode::OK, "OK")
        }
    }
}

async fn process_payment_event(state: AppState, headers: HeaderMap, payment_id: String) {
    let Some(client) = state.mercadopago.clone() else {
        tracing::warn!("MercadoPago webhook received but provider is not configured");
        return;
    };

    if !verify_if_configured(&client, &headers, &payment_id) {
        return;
    }

    // The payment may not be queryable for a second or two after the event
    // fires; the adapter retries on not-found-yet only.
    let payment = match client.get_payment_with_retry(&payment_id).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("MercadoPago payment {} lookup failed: {}", payment_id, e);
            return;
        }
    };

    if !mercadopago::is_final_success(&payment) {
        tracing::info!(
            "MercadoPago payment {} not final: status={}, detail={:?}",
            payment_id,
            payment.status,
            payment.status_detail
        );
        return;
    }

    let Some(user_id) = payment.external_reference.clone() else {
        tracing::error!(
            "MercadoPago payment {} carries no external_reference - cannot attribute",
            payment_id
        );
        return;
    };

    let record = mercadopago::normalize(&payment);
    apply_final_payment(&state, &user_id, record).await;
}

/// Signature check when a webhook secret is configured. Without a secret
/// there is nothing to verify; correlation plus the authoritative re-fetch
/// carry the trust.
fn verify_if_configured(client: &MercadoPagoClient, headers: &HeaderMap, data_id: &str) -> bool {
    if !client.has_webhook_secret() {
        return true;
    }

    let signature = headers.get("x-signature").and_then(|v| v.to_str().ok());
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let Some(signature) = signature else {
        tracing::warn!("MercadoPago webhook discarded: missing x-signature header");
        return false;
    };

    match client.verify_webhook_signature(data_id, request_id, signature) {
        Ok(true) => true,
        Ok(false) => {
            tracing::warn!("MercadoPago webhook discarded: invalid signature");
            false
        }
        Err(e) => {
            tracing::error!("MercadoPago signature verification error: {}", e);
            false
        }
    }
}
