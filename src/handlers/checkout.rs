use axum::{Extension, extract::State};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path};
use crate::middleware::AuthedUser;
use crate::models::{CheckoutIntent, Payment, PaymentRecord, Provider, User};
use crate::payments::{mercadopago, paypal};
use crate::reconcile::{self, ReconcileOutcome};

fn parse_provider(s: &str) -> Result<Provider> {
    s.parse()
        .map_err(|_| AppError::BadRequest(msg::INVALID_PROVIDER.into()))
}

fn mp_client(state: &AppState) -> Result<&mercadopago::MercadoPagoClient> {
    state
        .mercadopago
        .as_ref()
        .ok_or_else(|| AppError::ProviderUnavailable(msg::PROVIDER_NOT_CONFIGURED.into()))
}

fn pp_client(state: &AppState) -> Result<&paypal::PayPalClient> {
    state
        .paypal
        .as_ref()
        .ok_or_else(|| AppError::ProviderUnavailable(msg::PROVIDER_NOT_CONFIGURED.into()))
}

/// POST /payments/{provider}/create-intent
///
/// Creates a provider-side order for the fixed-price PRO upgrade, tagged
/// with the caller's user id so later callbacks can be attributed.
pub async fn create_intent(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<CheckoutIntent>> {
    let provider = parse_provider(&provider)?;

    if user.is_pro {
        return Err(AppError::Conflict(msg::ALREADY_PRO.into()));
    }

    let intent = match provider {
        Provider::MercadoPago => {
            mp_client(&state)?
                .create_preference(
                    &user.id,
                    state.pro_price_cents,
                    &state.pro_currency,
                    &state.base_url,
                )
                .await?
        }
        Provider::PayPal => {
            pp_client(&state)?
                .create_order(
                    &user.id,
                    state.pro_price_cents,
                    &state.pro_currency,
                    &state.base_url,
                )
                .await?
        }
        Provider::Simulation => {
            if !state.dev_mode {
                return Err(AppError::BadRequest(msg::SIMULATION_DISABLED.into()));
            }
            CheckoutIntent {
                provider_order_id: format!("sim_{}", Uuid::new_v4().as_simple()),
                redirect_url: format!("{}/checkout/success", state.base_url),
            }
        }
    };

    Ok(Json(intent))
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub is_pro: bool,
    /// True when the payment was already reconciled (duplicate confirmation,
    /// or the webhook got there first). Rendered as success either way.
    pub already_processed: bool,
}

/// POST /payments/{provider}/capture/{order_id}
///
/// The synchronous confirmation path: the client returned from the
/// provider's checkout and asks us to finalize. Funnels into the same
/// reconcile chokepoint as the webhook path.
pub async fn capture_payment(
    State(state): State<AppState>,
    Path((provider, order_id)): Path<(String, String)>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<CaptureResponse>> {
    let provider = parse_provider(&provider)?;

    let (user_id, record) = match provider {
        Provider::PayPal => {
            let client = pp_client(&state)?;
            let order = client
                .get_order(&order_id)
                .await?
                .or_not_found(msg::PAYMENT_NOT_FOUND)?;

            check_attribution(paypal::attributed_user(&order), &user)?;

            let captured = if order.status == "COMPLETED" {
                // Already captured (e.g. by an earlier confirmation) - the
                // existing details stand in for a fresh capture.
                order
            } else if order.status == "APPROVED" {
                client.capture_order(&order_id).await?
            } else {
                return Err(AppError::CaptureConflict(order.status));
            };

            if !paypal::is_final_success(&captured) {
                return Err(AppError::CaptureConflict(captured.status));
            }

            (user.id.clone(), paypal::normalize(&captured))
        }
        Provider::MercadoPago => {
            // MercadoPago has no distinct capture step; {order_id} here is
            // the payment id the back-url redirect carries.
            let client = mp_client(&state)?;
            let payment = client
                .get_payment(&order_id)
                .await?
                .or_not_found(msg::PAYMENT_NOT_FOUND)?;

            check_attribution(payment.external_reference.clone(), &user)?;

            if !mercadopago::is_final_success(&payment) {
                return Err(AppError::CaptureConflict(payment.status));
            }

            (user.id.clone(), mercadopago::normalize(&payment))
        }
        Provider::Simulation => {
            if !state.dev_mode {
                return Err(AppError::BadRequest(msg::SIMULATION_DISABLED.into()));
            }
            (user.id.clone(), simulated_record(&state, &user, &order_id))
        }
    };

    let mut conn = state.db.get()?;
    let outcome = reconcile::reconcile(&mut conn, &user_id, &record)?;

    Ok(Json(CaptureResponse {
        is_pro: true,
        already_processed: outcome == ReconcileOutcome::AlreadyReconciled,
    }))
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub record: PaymentRecord,
    pub is_final_success: bool,
}

/// GET /payments/{provider}/{payment_id}/status
///
/// Read-only view over the provider's current state, without side effects.
pub async fn payment_status(
    State(state): State<AppState>,
    Path((provider, payment_id)): Path<(String, String)>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<PaymentStatusResponse>> {
    let provider = parse_provider(&provider)?;

    let (record, is_final) = match provider {
        Provider::MercadoPago => {
            let payment = mp_client(&state)?
                .get_payment(&payment_id)
                .await?
                .or_not_found(msg::PAYMENT_NOT_FOUND)?;

            check_attribution(payment.external_reference.clone(), &user)?;

            let is_final = mercadopago::is_final_success(&payment);
            (mercadopago::normalize(&payment), is_final)
        }
        Provider::PayPal => {
            let order = pp_client(&state)?
                .get_order(&payment_id)
                .await?
                .or_not_found(msg::PAYMENT_NOT_FOUND)?;

            check_attribution(paypal::attributed_user(&order), &user)?;

            let is_final = paypal::is_final_success(&order);
            (paypal::normalize(&order), is_final)
        }
        Provider::Simulation => {
            // Nothing lives provider-side; answer from the audit log.
            let conn = state.db.get()?;
            let payment =
                queries::get_payment_by_provider_id(&conn, Provider::Simulation, &payment_id)?
                    .or_not_found(msg::PAYMENT_NOT_FOUND)?;

            if payment.user_id != user.id {
                return Err(AppError::Forbidden(msg::PAYMENT_NOT_YOURS.into()));
            }
            (payment.record, true)
        }
    };

    Ok(Json(PaymentStatusResponse {
        record,
        is_final_success: is_final,
    }))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub payments: Vec<Payment>,
}

/// GET /me - the caller's entitlement state and payment history.
pub async fn me(
    State(state): State<AppState>,
    Extension(AuthedUser(user)): Extension<AuthedUser>,
) -> Result<Json<MeResponse>> {
    let conn = state.db.get()?;
    let payments = queries::list_payments_for_user(&conn, &user.id)?;

    Ok(Json(MeResponse { user, payments }))
}

/// 403 when the provider's echoed user reference doesn't match the caller.
/// An order with no reference at all cannot prove ownership and is rejected
/// the same way.
fn check_attribution(attributed: Option<String>, caller: &User) -> Result<()> {
    match attributed {
        Some(ref id) if *id == caller.id => Ok(()),
        _ => Err(AppError::Forbidden(msg::PAYMENT_NOT_YOURS.into())),
    }
}

fn simulated_record(state: &AppState, user: &User, order_id: &str) -> PaymentRecord {
    PaymentRecord {
        payment_id: format!("simpay_{}", order_id),
        provider_order_id: Some(order_id.to_string()),
        provider: Provider::Simulation,
        amount_cents: state.pro_price_cents,
        currency: state.pro_currency.clone(),
        status: "approved".to_string(),
        status_detail: Some("accredited".to_string()),
        payment_method: Some("simulation".to_string()),
        payment_type: None,
        payer_email: Some(user.email.clone()),
        payer_name: Some(user.name.clone()),
        payer_id: None,
        approved_at: Some(chrono::Utc::now().timestamp()),
    }
}
