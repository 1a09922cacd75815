use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::PayPalConfig;
use crate::error::{AppError, Result, msg};
use crate::models::{CheckoutIntent, PaymentRecord, Provider};

use super::{build_http_client, cents_from_decimal_str, decimal_str_from_cents};

/// Same read-side lag handling as the MercadoPago adapter.
const LOOKUP_ATTEMPTS: u32 = 5;
const LOOKUP_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Raw order as returned by the v2 Checkout Orders API.
#[derive(Debug, Clone, Deserialize)]
pub struct PpOrder {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub purchase_units: Vec<PpPurchaseUnit>,
    pub payer: Option<PpPayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PpPurchaseUnit {
    pub custom_id: Option<String>,
    pub amount: Option<PpAmount>,
    pub payments: Option<PpPayments>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PpPayments {
    #[serde(default)]
    pub captures: Vec<PpCapture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PpCapture {
    pub id: String,
    pub status: String,
    pub amount: Option<PpAmount>,
    pub custom_id: Option<String>,
    pub create_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PpAmount {
    pub currency_code: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PpPayer {
    pub email_address: Option<String>,
    pub payer_id: Option<String>,
    pub name: Option<PpName>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PpName {
    pub given_name: Option<String>,
    pub surname: Option<String>,
}

fn first_capture(order: &PpOrder) -> Option<&PpCapture> {
    order
        .purchase_units
        .first()
        .and_then(|u| u.payments.as_ref())
        .and_then(|p| p.captures.first())
}

/// Funds have definitively moved only when the order AND its capture record
/// both read COMPLETED. An APPROVED order, or a capture still PENDING, is
/// not final.
pub fn is_final_success(order: &PpOrder) -> bool {
    order.status == "COMPLETED"
        && first_capture(order).is_some_and(|c| c.status == "COMPLETED")
}

/// The user id echoed back in the order's custom reference.
pub fn attributed_user(order: &PpOrder) -> Option<String> {
    first_capture(order)
        .and_then(|c| c.custom_id.clone())
        .or_else(|| {
            order
                .purchase_units
                .first()
                .and_then(|u| u.custom_id.clone())
        })
}

/// Map the provider shape into the common record. `payment_id` is the
/// capture id (the id of the money movement); the order id only
/// cross-references. Orders without a capture yet fall back to the order id
/// so the status endpoint can still render them; such records never reach
/// reconcile because the final-success gate rejects them first.
pub fn normalize(order: &PpOrder) -> PaymentRecord {
    let capture = first_capture(order);
    let amount = capture
        .and_then(|c| c.amount.as_ref())
        .or_else(|| order.purchase_units.first().and_then(|u| u.amount.as_ref()));

    let payer_name = order.payer.as_ref().and_then(|p| p.name.as_ref()).and_then(|n| {
        match (n.given_name.as_deref(), n.surname.as_deref()) {
            (Some(g), Some(s)) => Some(format!("{} {}", g, s)),
            (Some(g), None) => Some(g.to_string()),
            (None, Some(s)) => Some(s.to_string()),
            (None, None) => None,
        }
    });

    PaymentRecord {
        payment_id: capture.map(|c| c.id.clone()).unwrap_or_else(|| order.id.clone()),
        provider_order_id: Some(order.id.clone()),
        provider: Provider::PayPal,
        amount_cents: amount
            .and_then(|a| cents_from_decimal_str(&a.value))
            .unwrap_or(0),
        currency: amount
            .map(|a| a.currency_code.to_lowercase())
            .unwrap_or_default(),
        status: order.status.clone(),
        status_detail: capture.map(|c| c.status.clone()),
        payment_method: Some("paypal".to_string()),
        payment_type: None,
        payer_email: order.payer.as_ref().and_then(|p| p.email_address.clone()),
        payer_name,
        payer_id: order.payer.as_ref().and_then(|p| p.payer_id.clone()),
        approved_at: capture
            .and_then(|c| c.create_time.as_deref())
            .and_then(|d| chrono::DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.timestamp()),
    }
}

// ============ Orders API request/response shapes ============

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    intent: String,
    purchase_units: Vec<CreatePurchaseUnit>,
    application_context: ApplicationContext,
}

#[derive(Debug, Serialize)]
struct CreatePurchaseUnit {
    custom_id: String,
    description: String,
    amount: CreateAmount,
}

#[derive(Debug, Serialize)]
struct CreateAmount {
    currency_code: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct ApplicationContext {
    return_url: String,
    cancel_url: String,
    user_action: String,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    #[serde(default)]
    links: Vec<PpLink>,
}

#[derive(Debug, Deserialize)]
struct PpLink {
    href: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    details: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    issue: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PayPalClient {
    client: Client,
    client_id: String,
    client_secret: String,
    base_url: String,
    webhook_id: String,
    // Cached bearer token with its expiry (unix seconds).
    token: Arc<RwLock<Option<(String, i64)>>>,
}

impl PayPalClient {
    /// Credentials are validated here so a misconfigured deployment fails at
    /// startup, not on the first checkout.
    pub fn new(config: &PayPalConfig) -> Result<Self> {
        if config.client_id.trim().is_empty() || config.client_secret.trim().is_empty() {
            return Err(AppError::Internal("PayPal credentials are empty".into()));
        }

        Ok(Self {
            client: build_http_client()?,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            base_url: config.base_url().to_string(),
            webhook_id: config.webhook_id.clone(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// OAuth client-credentials exchange, cached until shortly before
    /// expiry.
    async fn access_token(&self) -> Result<String> {
        {
            let cached = self.token.read().await;
            if let Some((token, expiry)) = &*cached
                && *expiry > chrono::Utc::now().timestamp()
            {
                return Ok(token.clone());
            }
        }

        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("PayPal auth error: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ProviderUnavailable(format!(
                "PayPal auth failed: {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("PayPal auth parse error: {}", e)))?;

        let expiry = chrono::Utc::now().timestamp() + body.expires_in.unwrap_or(3600) - 60;
        let mut cached = self.token.write().await;
        *cached = Some((body.access_token.clone(), expiry));

        Ok(body.access_token)
    }

    /// Create a fixed-price order tagged with the user id in `custom_id`.
    pub async fn create_order(
        &self,
        user_id: &str,
        amount_cents: i64,
        currency: &str,
        base_url: &str,
    ) -> Result<CheckoutIntent> {
        let token = self.access_token().await?;

        let request = CreateOrderRequest {
            intent: "CAPTURE".to_string(),
            purchase_units: vec![CreatePurchaseUnit {
                custom_id: user_id.to_string(),
                description: "Saludo PRO upgrade".to_string(),
                amount: CreateAmount {
                    currency_code: currency.to_uppercase(),
                    value: decimal_str_from_cents(amount_cents),
                },
            }],
            application_context: ApplicationContext {
                return_url: format!("{}/checkout/success", base_url),
                cancel_url: format!("{}/checkout/failure", base_url),
                user_action: "PAY_NOW".to_string(),
            },
        };

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("PayPal API error: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderUnavailable(format!(
                "PayPal API error: {}",
                error_text
            )));
        }

        let order: CreateOrderResponse = response.json().await.map_err(|e| {
            AppError::ProviderUnavailable(format!("Failed to parse PayPal response: {}", e))
        })?;

        let approve_url = order
            .links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href.clone())
            .ok_or_else(|| {
                AppError::ProviderUnavailable("PayPal order has no approve link".into())
            })?;

        Ok(CheckoutIntent {
            provider_order_id: order.id,
            redirect_url: approve_url,
        })
    }

    /// Read-only order lookup. Returns `Ok(None)` on 404.
    pub async fn get_order(&self, order_id: &str) -> Result<Option<PpOrder>> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(format!("{}/v2/checkout/orders/{}", self.base_url, order_id))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("PayPal API error: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderUnavailable(format!(
                "PayPal API error: {}",
                error_text
            )));
        }

        let order: PpOrder = response.json().await.map_err(|e| {
            AppError::ProviderUnavailable(format!("Failed to parse PayPal order: {}", e))
        })?;

        Ok(Some(order))
    }

    /// Order lookup with bounded retry on "not found yet", for the webhook
    /// path where the read side can lag the event.
    pub async fn get_order_with_retry(&self, order_id: &str) -> Result<PpOrder> {
        for attempt in 1..=LOOKUP_ATTEMPTS {
            if let Some(order) = self.get_order(order_id).await? {
                return Ok(order);
            }

            if attempt < LOOKUP_ATTEMPTS {
                tracing::debug!(
                    "PayPal order {} not queryable yet (attempt {}/{})",
                    order_id,
                    attempt,
                    LOOKUP_ATTEMPTS
                );
                tokio::time::sleep(LOOKUP_RETRY_DELAY).await;
            }
        }

        Err(AppError::NotFound(msg::PAYMENT_NOT_FOUND.to_string()))
    }

    /// Finalize payment collection for an approved order.
    ///
    /// Idempotent at the provider-call level: PayPal rejects a re-capture of
    /// an already-captured order with ORDER_ALREADY_CAPTURED, which is
    /// treated as success (the existing order is fetched and returned). An
    /// order the payer never approved surfaces as `CaptureConflict`.
    pub async fn capture_order(&self, order_id: &str) -> Result<PpOrder> {
        let token = self.access_token().await?;

        let response = self
            .client
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.base_url, order_id
            ))
            .bearer_auth(&token)
            .header("Prefer", "return=representation")
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("PayPal API error: {}", e)))?;

        let status = response.status();

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            let issue = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|e| e.details.into_iter().find_map(|d| d.issue))
                .unwrap_or_default();

            return match issue.as_str() {
                "ORDER_ALREADY_CAPTURED" => {
                    self.get_order(order_id)
                        .await?
                        .ok_or_else(|| AppError::NotFound(msg::PAYMENT_NOT_FOUND.to_string()))
                }
                "ORDER_NOT_APPROVED" => Err(AppError::CaptureConflict("CREATED".to_string())),
                _ => Err(AppError::CaptureConflict(issue)),
            };
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderUnavailable(format!(
                "PayPal capture error: {}",
                error_text
            )));
        }

        let order: PpOrder = response.json().await.map_err(|e| {
            AppError::ProviderUnavailable(format!("Failed to parse PayPal capture: {}", e))
        })?;

        Ok(order)
    }

    /// Verify a webhook callback via PayPal's verify-webhook-signature API.
    ///
    /// This is a server-to-server call; the raw request body must be passed
    /// through byte-exact.
    pub async fn verify_webhook_signature(
        &self,
        headers: &VerificationHeaders,
        raw_body: &[u8],
    ) -> Result<bool> {
        let token = self.access_token().await?;

        let webhook_event: serde_json::Value = serde_json::from_slice(raw_body)?;
        let request = serde_json::json!({
            "auth_algo": headers.auth_algo,
            "cert_url": headers.cert_url,
            "transmission_id": headers.transmission_id,
            "transmission_sig": headers.transmission_sig,
            "transmission_time": headers.transmission_time,
            "webhook_id": self.webhook_id,
            "webhook_event": webhook_event,
        });

        let response = self
            .client
            .post(format!(
                "{}/v1/notification/verify-webhook-signature",
                self.base_url
            ))
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("PayPal verify error: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ProviderUnavailable(format!(
                "PayPal verify failed: {}",
                response.status()
            )));
        }

        #[derive(Deserialize)]
        struct VerifyResponse {
            verification_status: String,
        }

        let body: VerifyResponse = response.json().await.map_err(|e| {
            AppError::ProviderUnavailable(format!("PayPal verify parse error: {}", e))
        })?;

        Ok(body.verification_status == "SUCCESS")
    }
}

/// Transmission headers PayPal attaches to every webhook delivery.
#[derive(Debug, Clone)]
pub struct VerificationHeaders {
    pub auth_algo: String,
    pub cert_url: String,
    pub transmission_id: String,
    pub transmission_sig: String,
    pub transmission_time: String,
}

/// Extract the five verification headers, or None if any is missing. A
/// callback without a complete header set can never verify and is dropped
/// before any API call.
pub fn extract_verification_headers(headers: &HeaderMap) -> Option<VerificationHeaders> {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    };

    Some(VerificationHeaders {
        auth_algo: get("paypal-auth-algo")?,
        cert_url: get("paypal-cert-url")?,
        transmission_id: get("paypal-transmission-id")?,
        transmission_sig: get("paypal-transmission-sig")?,
        transmission_time: get("paypal-transmission-time")?,
    })
}

/// Normalized PayPal webhook event.
///
/// Only PAYMENT.CAPTURE.COMPLETED grants entitlements.
/// CHECKOUT.ORDER.APPROVED is deliberately ignored: capturing from the
/// webhook would race the client-driven capture path.
#[derive(Debug)]
pub enum PayPalWebhookEvent {
    CaptureCompleted(CaptureResource),
    Ignored,
}

/// The capture object embedded in a PAYMENT.CAPTURE.COMPLETED event.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureResource {
    pub id: String,
    pub status: String,
    pub amount: Option<PpAmount>,
    pub custom_id: Option<String>,
    pub create_time: Option<String>,
    pub supplementary_data: Option<SupplementaryData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupplementaryData {
    pub related_ids: Option<RelatedIds>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedIds {
    pub order_id: Option<String>,
}

impl CaptureResource {
    pub fn order_id(&self) -> Option<&str> {
        self.supplementary_data
            .as_ref()
            .and_then(|s| s.related_ids.as_ref())
            .and_then(|r| r.order_id.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct RawWebhookEvent {
    event_type: String,
    resource: serde_json::Value,
}

pub fn parse_webhook_event(body: &[u8]) -> PayPalWebhookEvent {
    let event: RawWebhookEvent = match serde_json::from_slice(body) {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!("Unparseable PayPal webhook body: {}", e);
            return PayPalWebhookEvent::Ignored;
        }
    };

    if event.event_type != "PAYMENT.CAPTURE.COMPLETED" {
        return PayPalWebhookEvent::Ignored;
    }

    match serde_json::from_value::<CaptureResource>(event.resource) {
        Ok(resource) => PayPalWebhookEvent::CaptureCompleted(resource),
        Err(e) => {
            tracing::warn!("Failed to parse PayPal capture resource: {}", e);
            PayPalWebhookEvent::Ignored
        }
    }
}

/// Build a PaymentRecord straight from the webhook's embedded capture
/// resource, when it is self-sufficient (completed, attributed). Returns the
/// attributed user id with the record. Callers fall back to an order fetch
/// when this returns None.
pub fn record_from_capture(resource: &CaptureResource) -> Option<(String, PaymentRecord)> {
    if resource.status != "COMPLETED" {
        return None;
    }

    let user_id = resource.custom_id.clone()?;

    let record = PaymentRecord {
        payment_id: resource.id.clone(),
        provider_order_id: resource.order_id().map(|s| s.to_string()),
        provider: Provider::PayPal,
        amount_cents: resource
            .amount
            .as_ref()
            .and_then(|a| cents_from_decimal_str(&a.value))
            .unwrap_or(0),
        currency: resource
            .amount
            .as_ref()
            .map(|a| a.currency_code.to_lowercase())
            .unwrap_or_default(),
        status: "COMPLETED".to_string(),
        status_detail: Some(resource.status.clone()),
        payment_method: Some("paypal".to_string()),
        payment_type: None,
        payer_email: None,
        payer_name: None,
        payer_id: None,
        approved_at: resource
            .create_time
            .as_deref()
            .and_then(|d| chrono::DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.timestamp()),
    };

    Some((user_id, record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_order() -> PpOrder {
        PpOrder {
            id: "ORDER-1".to_string(),
            status: "COMPLETED".to_string(),
            purchase_units: vec![PpPurchaseUnit {
                custom_id: Some("user-1".to_string()),
                amount: Some(PpAmount {
                    currency_code: "USD".to_string(),
                    value: "5.00".to_string(),
                }),
                payments: Some(PpPayments {
                    captures: vec![PpCapture {
                        id: "CAP-1".to_string(),
                        status: "COMPLETED".to_string(),
                        amount: Some(PpAmount {
                            currency_code: "USD".to_string(),
                            value: "5.00".to_string(),
                        }),
                        custom_id: Some("user-1".to_string()),
                        create_time: Some("2024-06-01T12:00:00Z".to_string()),
                    }],
                }),
            }],
            payer: Some(PpPayer {
                email_address: Some("payer@example.com".to_string()),
                payer_id: Some("PAYER1".to_string()),
                name: Some(PpName {
                    given_name: Some("Ana".to_string()),
                    surname: Some("García".to_string()),
                }),
            }),
        }
    }

    #[test]
    fn test_final_success_requires_order_and_capture_completed() {
        let mut order = completed_order();
        assert!(is_final_success(&order));

        // Capture pending: not final, even though the order says COMPLETED.
        order.purchase_units[0]
            .payments
            .as_mut()
            .unwrap()
            .captures[0]
            .status = "PENDING".to_string();
        assert!(!is_final_success(&order));

        // Approved but never captured: not final.
        let mut order = completed_order();
        order.status = "APPROVED".to_string();
        order.purchase_units[0].payments = None;
        assert!(!is_final_success(&order));

        // No capture at all.
        let mut order = completed_order();
        order.purchase_units[0].payments = Some(PpPayments { captures: vec![] });
        assert!(!is_final_success(&order));
    }

    #[test]
    fn test_normalize_uses_capture_id() {
        let record = normalize(&completed_order());
        assert_eq!(record.payment_id, "CAP-1");
        assert_eq!(record.provider_order_id.as_deref(), Some("ORDER-1"));
        assert_eq!(record.provider, Provider::PayPal);
        assert_eq!(record.amount_cents, 500);
        assert_eq!(record.currency, "usd");
        assert_eq!(record.payer_name.as_deref(), Some("Ana García"));
    }

    #[test]
    fn test_normalize_order_without_capture() {
        let mut order = completed_order();
        order.status = "CREATED".to_string();
        order.purchase_units[0].payments = None;
        order.payer = None;

        let record = normalize(&order);
        assert_eq!(record.payment_id, "ORDER-1");
        assert_eq!(record.status, "CREATED");
        assert_eq!(record.payer_email, None);
    }

    #[test]
    fn test_attributed_user_falls_back_to_purchase_unit() {
        let mut order = completed_order();
        order.purchase_units[0]
            .payments
            .as_mut()
            .unwrap()
            .captures[0]
            .custom_id = None;
        assert_eq!(attributed_user(&order).as_deref(), Some("user-1"));
    }

    #[test]
    fn test_parse_capture_completed_event() {
        let body = serde_json::json!({
            "id": "WH-1",
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": {
                "id": "CAP-9",
                "status": "COMPLETED",
                "amount": {"currency_code": "USD", "value": "5.00"},
                "custom_id": "user-7",
                "supplementary_data": {"related_ids": {"order_id": "ORDER-9"}}
            }
        });

        match parse_webhook_event(serde_json::to_vec(&body).unwrap().as_slice()) {
            PayPalWebhookEvent::CaptureCompleted(resource) => {
                assert_eq!(resource.id, "CAP-9");
                assert_eq!(resource.order_id(), Some("ORDER-9"));

                let (user_id, record) = record_from_capture(&resource).unwrap();
                assert_eq!(user_id, "user-7");
                assert_eq!(record.payment_id, "CAP-9");
                assert_eq!(record.amount_cents, 500);
            }
            other => panic!("expected CaptureCompleted, got {:?}", other),
        }
    }

    #[test]
    fn test_order_approved_event_is_ignored() {
        let body = serde_json::json!({
            "id": "WH-2",
            "event_type": "CHECKOUT.ORDER.APPROVED",
            "resource": {"id": "ORDER-2", "status": "APPROVED"}
        });

        assert!(matches!(
            parse_webhook_event(serde_json::to_vec(&body).unwrap().as_slice()),
            PayPalWebhookEvent::Ignored
        ));
    }

    #[test]
    fn test_pending_capture_resource_yields_no_record() {
        let resource = CaptureResource {
            id: "CAP-3".to_string(),
            status: "PENDING".to_string(),
            amount: None,
            custom_id: Some("user-1".to_string()),
            create_time: None,
            supplementary_data: None,
        };
        assert!(record_from_capture(&resource).is_none());
    }

    #[test]
    fn test_unattributed_capture_resource_yields_no_record() {
        let resource = CaptureResource {
            id: "CAP-4".to_string(),
            status: "COMPLETED".to_string(),
            amount: None,
            custom_id: None,
            create_time: None,
            supplementary_data: None,
        };
        assert!(record_from_capture(&resource).is_none());
    }

    #[test]
    fn test_missing_verification_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("paypal-auth-algo", "SHA256withRSA".parse().unwrap());
        headers.insert("paypal-transmission-id", "t-1".parse().unwrap());
        // cert-url, sig, and time missing
        assert!(extract_verification_headers(&headers).is_none());

        headers.insert(
            "paypal-cert-url",
            "https://api.paypal.com/cert".parse().unwrap(),
        );
        headers.insert("paypal-transmission-sig", "sig".parse().unwrap(),);
        headers.insert(
            "paypal-transmission-time",
            "2024-06-01T12:00:00Z".parse().unwrap(),
        );
        assert!(extract_verification_headers(&headers).is_some());
    }
}
