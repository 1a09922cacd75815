use std::collections::HashMap;
use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::MercadoPagoConfig;
use crate::error::{AppError, Result, msg};
use crate::models::{CheckoutIntent, PaymentRecord, Provider};

use super::build_http_client;

type HmacSha256 = Hmac<Sha256>;

const API_BASE: &str = "https://api.mercadopago.com";

/// A payment is not always queryable immediately after its webhook fires;
/// MercadoPago's read side lags the event by a second or two.
const LOOKUP_ATTEMPTS: u32 = 5;
const LOOKUP_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct CreatePreferenceRequest {
    items: Vec<PreferenceItem>,
    external_reference: String,
    back_urls: BackUrls,
    auto_return: String,
    notification_url: String,
}

#[derive(Debug, Serialize)]
struct PreferenceItem {
    title: String,
    quantity: u32,
    unit_price: f64,
    currency_id: String,
}

#[derive(Debug, Serialize)]
struct BackUrls {
    success: String,
    failure: String,
    pending: String,
}

#[derive(Debug, Deserialize)]
struct CreatePreferenceResponse {
    id: String,
    init_point: String,
}

/// Raw payment as returned by GET /v1/payments/{id}.
///
/// Optional sub-fields stay optional all the way through; `normalize`
/// substitutes nulls rather than failing on a sparse payer block.
#[derive(Debug, Clone, Deserialize)]
pub struct MpPayment {
    pub id: i64,
    pub status: String,
    pub status_detail: Option<String>,
    pub transaction_amount: Option<f64>,
    pub currency_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub payment_type_id: Option<String>,
    pub external_reference: Option<String>,
    pub order: Option<MpOrderRef>,
    pub payer: Option<MpPayer>,
    pub date_approved: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MpOrderRef {
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MpPayer {
    pub id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// The payment is final only when BOTH fields agree: MercadoPago reports
/// some "approved" payments with a non-accredited detail (in mediation,
/// pending capture) that are still reversible.
pub fn is_final_success(payment: &MpPayment) -> bool {
    payment.status == "approved" && payment.status_detail.as_deref() == Some("accredited")
}

/// Map the provider shape into the common record. This is the only place
/// MercadoPago response fields escape the adapter.
pub fn normalize(payment: &MpPayment) -> PaymentRecord {
    let payer_name = payment.payer.as_ref().and_then(|p| {
        match (p.first_name.as_deref(), p.last_name.as_deref()) {
            (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
            (Some(f), None) => Some(f.to_string()),
            (None, Some(l)) => Some(l.to_string()),
            (None, None) => None,
        }
    });

    PaymentRecord {
        payment_id: payment.id.to_string(),
        provider_order_id: payment
            .order
            .as_ref()
            .and_then(|o| o.id.map(|id| id.to_string())),
        provider: Provider::MercadoPago,
        amount_cents: payment
            .transaction_amount
            .map(|a| (a * 100.0).round() as i64)
            .unwrap_or(0),
        currency: payment
            .currency_id
            .as_deref()
            .unwrap_or_default()
            .to_lowercase(),
        status: payment.status.clone(),
        status_detail: payment.status_detail.clone(),
        payment_method: payment.payment_method_id.clone(),
        payment_type: payment.payment_type_id.clone(),
        payer_email: payment.payer.as_ref().and_then(|p| p.email.clone()),
        payer_name,
        payer_id: payment.payer.as_ref().and_then(|p| p.id.clone()),
        approved_at: payment
            .date_approved
            .as_deref()
            .and_then(|d| chrono::DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.timestamp()),
    }
}

#[derive(Debug, Clone)]
pub struct MercadoPagoClient {
    client: Client,
    access_token: String,
    webhook_secret: Option<String>,
}

impl MercadoPagoClient {
    /// Credentials are validated here so a misconfigured deployment fails at
    /// startup, not on the first checkout.
    pub fn new(config: &MercadoPagoConfig) -> Result<Self> {
        if config.access_token.trim().is_empty() {
            return Err(AppError::Internal(
                "MercadoPago access token is empty".into(),
            ));
        }

        Ok(Self {
            client: build_http_client()?,
            access_token: config.access_token.clone(),
            webhook_secret: config.webhook_secret.clone(),
        })
    }

    pub fn has_webhook_secret(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// Create a checkout preference for the fixed-price PRO upgrade, tagging
    /// it with the user id so webhooks and captures can be attributed back.
    pub async fn create_preference(
        &self,
        user_id: &str,
        amount_cents: i64,
        currency: &str,
        base_url: &str,
    ) -> Result<CheckoutIntent> {
        let request = CreatePreferenceRequest {
            items: vec![PreferenceItem {
                title: "Saludo PRO upgrade".to_string(),
                quantity: 1,
                unit_price: amount_cents as f64 / 100.0,
                currency_id: currency.to_uppercase(),
            }],
            external_reference: user_id.to_string(),
            back_urls: BackUrls {
                success: format!("{}/checkout/success", base_url),
                failure: format!("{}/checkout/failure", base_url),
                pending: format!("{}/checkout/pending", base_url),
            },
            auto_return: "approved".to_string(),
            notification_url: format!("{}/webhooks/mercadopago", base_url),
        };

        let response = self
            .client
            .post(format!("{}/checkout/preferences", API_BASE))
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("MercadoPago API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderUnavailable(format!(
                "MercadoPago API error: {}",
                error_text
            )));
        }

        let preference: CreatePreferenceResponse = response.json().await.map_err(|e| {
            AppError::ProviderUnavailable(format!("Failed to parse MercadoPago response: {}", e))
        })?;

        Ok(CheckoutIntent {
            provider_order_id: preference.id,
            redirect_url: preference.init_point,
        })
    }

    /// Read-only payment lookup. Returns `Ok(None)` on 404 so callers can
    /// distinguish "not found yet, try again" from a hard failure.
    pub async fn get_payment(&self, payment_id: &str) -> Result<Option<MpPayment>> {
        let response = self
            .client
            .get(format!("{}/v1/payments/{}", API_BASE, payment_id))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("MercadoPago API error: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderUnavailable(format!(
                "MercadoPago API error: {}",
                error_text
            )));
        }

        let payment: MpPayment = response.json().await.map_err(|e| {
            AppError::ProviderUnavailable(format!("Failed to parse MercadoPago payment: {}", e))
        })?;

        Ok(Some(payment))
    }

    /// Lookup with bounded retry on "not found yet". A found-but-not-final
    /// payment is returned as-is; only absence is retried.
    pub async fn get_payment_with_retry(&self, payment_id: &str) -> Result<MpPayment> {
        for attempt in 1..=LOOKUP_ATTEMPTS {
            if let Some(payment) = self.get_payment(payment_id).await? {
                return Ok(payment);
            }

            if attempt < LOOKUP_ATTEMPTS {
                tracing::debug!(
                    "MercadoPago payment {} not queryable yet (attempt {}/{})",
                    payment_id,
                    attempt,
                    LOOKUP_ATTEMPTS
                );
                tokio::time::sleep(LOOKUP_RETRY_DELAY).await;
            }
        }

        Err(AppError::NotFound(msg::PAYMENT_NOT_FOUND.to_string()))
    }

    /// Maximum age of a webhook timestamp before it's rejected (in seconds).
    const WEBHOOK_TIMESTAMP_TOLERANCE_SECS: i64 = 300;

    /// Verify the `x-signature` header when a webhook secret is configured.
    ///
    /// MercadoPago signs the manifest `id:{data_id};request-id:{rid};ts:{ts};`
    /// with HMAC-SHA256. Signature format: `ts=timestamp,v1=hex`.
    pub fn verify_webhook_signature(
        &self,
        data_id: &str,
        request_id: &str,
        signature: &str,
    ) -> Result<bool> {
        let secret = match &self.webhook_secret {
            Some(s) => s,
            None => return Ok(true),
        };

        let mut timestamp = None;
        let mut sig_v1 = None;
        for part in signature.split(',') {
            let part = part.trim();
            if let Some(t) = part.strip_prefix("ts=") {
                timestamp = Some(t);
            } else if let Some(s) = part.strip_prefix("v1=") {
                sig_v1 = Some(s);
            }
        }

        let (Some(timestamp_str), Some(sig_v1)) = (timestamp, sig_v1) else {
            return Ok(false);
        };

        // Reject stale timestamps to prevent replay.
        let timestamp: i64 = match timestamp_str.parse() {
            Ok(t) => t,
            Err(_) => return Ok(false),
        };
        // The ts field has shipped as both seconds and milliseconds.
        let ts_secs = if timestamp > 1_000_000_000_000 {
            timestamp / 1000
        } else {
            timestamp
        };
        let age = chrono::Utc::now().timestamp() - ts_secs;
        if age > Self::WEBHOOK_TIMESTAMP_TOLERANCE_SECS || age < -60 {
            tracing::warn!("MercadoPago webhook rejected: timestamp out of tolerance (age={}s)", age);
            return Ok(false);
        }

        let manifest = format!(
            "id:{};request-id:{};ts:{};",
            data_id.to_lowercase(),
            request_id,
            timestamp_str
        );

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| AppError::Internal("Invalid MercadoPago webhook secret".into()))?;
        mac.update(manifest.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        // Constant-time comparison; the length check leaks nothing since the
        // digest length is fixed.
        let expected_bytes = expected.as_bytes();
        let provided_bytes = sig_v1.as_bytes();
        if expected_bytes.len() != provided_bytes.len() {
            return Ok(false);
        }

        Ok(expected_bytes.ct_eq(provided_bytes).into())
    }
}

/// Normalized MercadoPago webhook event. Only one event kind matters: "this
/// payment may now be final - re-fetch and check". Everything else is
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MpWebhookEvent {
    PaymentUpdated { payment_id: String },
    Ignored,
}

#[derive(Debug, Deserialize)]
struct MpWebhookBody {
    action: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    data: Option<MpWebhookData>,
}

#[derive(Debug, Deserialize)]
struct MpWebhookData {
    id: Option<serde_json::Value>,
}

/// Normalize both webhook shapes into the same internal event:
/// the JSON body form (`action`/`type`/`data.id`) and the legacy IPN
/// query-string form (`topic`/`id`).
///
/// A `payment.created` action is ignored: it signals the payment exists but
/// has not resolved to a final state yet; the `updated` event follows. The
/// embedded payload is never trusted for status - the caller re-fetches the
/// authoritative payment either way.
pub fn parse_webhook_event(query: &HashMap<String, String>, body: &[u8]) -> MpWebhookEvent {
    if let Ok(parsed) = serde_json::from_slice::<MpWebhookBody>(body) {
        let is_payment = parsed.kind.as_deref() == Some("payment")
            || parsed
                .action
                .as_deref()
                .is_some_and(|a| a.starts_with("payment."));

        if is_payment {
            if parsed.action.as_deref().is_some_and(|a| a.ends_with(".created")) {
                return MpWebhookEvent::Ignored;
            }

            if let Some(id) = parsed.data.and_then(|d| d.id).and_then(value_to_id) {
                return MpWebhookEvent::PaymentUpdated { payment_id: id };
            }
        }
    }

    // Legacy IPN: ?topic=payment&id=123
    if query.get("topic").map(String::as_str) == Some("payment") {
        if let Some(id) = query.get("id") {
            return MpWebhookEvent::PaymentUpdated {
                payment_id: id.clone(),
            };
        }
    }

    MpWebhookEvent::Ignored
}

// data.id arrives as a string in body events and a number in some IPN
// replays.
fn value_to_id(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approved_payment() -> MpPayment {
        MpPayment {
            id: 123456789,
            status: "approved".to_string(),
            status_detail: Some("accredited".to_string()),
            transaction_amount: Some(5.0),
            currency_id: Some("ARS".to_string()),
            payment_method_id: Some("visa".to_string()),
            payment_type_id: Some("credit_card".to_string()),
            external_reference: Some("user-1".to_string()),
            order: Some(MpOrderRef { id: Some(987) }),
            payer: Some(MpPayer {
                id: Some("42".to_string()),
                email: Some("payer@example.com".to_string()),
                first_name: Some("Ana".to_string()),
                last_name: Some("García".to_string()),
            }),
            date_approved: Some("2024-06-01T12:00:00.000-04:00".to_string()),
        }
    }

    #[test]
    fn test_final_success_requires_both_fields() {
        let mut payment = approved_payment();
        assert!(is_final_success(&payment));

        payment.status_detail = Some("pending_capture".to_string());
        assert!(!is_final_success(&payment));

        payment.status_detail = None;
        assert!(!is_final_success(&payment));

        payment.status = "in_process".to_string();
        payment.status_detail = Some("accredited".to_string());
        assert!(!is_final_success(&payment));
    }

    #[test]
    fn test_normalize_maps_common_fields() {
        let record = normalize(&approved_payment());
        assert_eq!(record.payment_id, "123456789");
        assert_eq!(record.provider_order_id.as_deref(), Some("987"));
        assert_eq!(record.provider, Provider::MercadoPago);
        assert_eq!(record.amount_cents, 500);
        assert_eq!(record.currency, "ars");
        assert_eq!(record.payer_name.as_deref(), Some("Ana García"));
        assert!(record.approved_at.is_some());
    }

    #[test]
    fn test_normalize_tolerates_missing_optionals() {
        let payment = MpPayment {
            id: 1,
            status: "approved".to_string(),
            status_detail: None,
            transaction_amount: None,
            currency_id: None,
            payment_method_id: None,
            payment_type_id: None,
            external_reference: None,
            order: None,
            payer: None,
            date_approved: None,
        };

        let record = normalize(&payment);
        assert_eq!(record.payment_id, "1");
        assert_eq!(record.provider_order_id, None);
        assert_eq!(record.amount_cents, 0);
        assert_eq!(record.payer_email, None);
        assert_eq!(record.payer_name, None);
        assert_eq!(record.approved_at, None);
    }

    #[test]
    fn test_parse_webhook_body_updated() {
        let body = br#"{"action":"payment.updated","type":"payment","data":{"id":"123"}}"#;
        assert_eq!(
            parse_webhook_event(&HashMap::new(), body),
            MpWebhookEvent::PaymentUpdated {
                payment_id: "123".to_string()
            }
        );
    }

    #[test]
    fn test_parse_webhook_created_is_ignored() {
        let body = br#"{"action":"payment.created","type":"payment","data":{"id":"123"}}"#;
        assert_eq!(
            parse_webhook_event(&HashMap::new(), body),
            MpWebhookEvent::Ignored
        );
    }

    #[test]
    fn test_parse_webhook_numeric_data_id() {
        let body = br#"{"action":"payment.updated","type":"payment","data":{"id":456}}"#;
        assert_eq!(
            parse_webhook_event(&HashMap::new(), body),
            MpWebhookEvent::PaymentUpdated {
                payment_id: "456".to_string()
            }
        );
    }

    #[test]
    fn test_parse_legacy_ipn_query() {
        let mut query = HashMap::new();
        query.insert("topic".to_string(), "payment".to_string());
        query.insert("id".to_string(), "789".to_string());

        assert_eq!(
            parse_webhook_event(&query, b""),
            MpWebhookEvent::PaymentUpdated {
                payment_id: "789".to_string()
            }
        );
    }

    #[test]
    fn test_parse_merchant_order_topic_is_ignored() {
        let mut query = HashMap::new();
        query.insert("topic".to_string(), "merchant_order".to_string());
        query.insert("id".to_string(), "789".to_string());

        assert_eq!(parse_webhook_event(&query, b""), MpWebhookEvent::Ignored);
    }

    fn client_with_secret(secret: &str) -> MercadoPagoClient {
        MercadoPagoClient::new(&crate::config::MercadoPagoConfig {
            access_token: "TEST-TOKEN".to_string(),
            webhook_secret: Some(secret.to_string()),
        })
        .unwrap()
    }

    fn sign(secret: &str, data_id: &str, request_id: &str, ts: i64) -> String {
        let manifest = format!("id:{};request-id:{};ts:{};", data_id, request_id, ts);
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(manifest.as_bytes());
        format!("ts={},v1={}", ts, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_verify_webhook_signature_accepts_valid() {
        let client = client_with_secret("shh");
        let ts = chrono::Utc::now().timestamp();
        let signature = sign("shh", "123", "req-1", ts);
        assert!(client.verify_webhook_signature("123", "req-1", &signature).unwrap());
    }

    #[test]
    fn test_verify_webhook_signature_rejects_tampered() {
        let client = client_with_secret("shh");
        let ts = chrono::Utc::now().timestamp();
        // Signed for a different payment id
        let signature = sign("shh", "999", "req-1", ts);
        assert!(!client.verify_webhook_signature("123", "req-1", &signature).unwrap());
    }

    #[test]
    fn test_verify_webhook_signature_rejects_stale_timestamp() {
        let client = client_with_secret("shh");
        let ts = chrono::Utc::now().timestamp() - 3600;
        let signature = sign("shh", "123", "req-1", ts);
        assert!(!client.verify_webhook_signature("123", "req-1", &signature).unwrap());
    }

    #[test]
    fn test_verify_webhook_signature_rejects_malformed_header() {
        let client = client_with_secret("shh");
        assert!(!client.verify_webhook_signature("123", "req-1", "garbage").unwrap());
    }

    #[test]
    fn test_verify_without_secret_is_pass_through() {
        let client = MercadoPagoClient::new(&crate::config::MercadoPagoConfig {
            access_token: "TEST-TOKEN".to_string(),
            webhook_secret: None,
        })
        .unwrap();
        assert!(client.verify_webhook_signature("123", "req-1", "anything").unwrap());
    }

    #[test]
    fn test_parse_garbage_is_ignored() {
        assert_eq!(
            parse_webhook_event(&HashMap::new(), b"not json"),
            MpWebhookEvent::Ignored
        );
    }
}
