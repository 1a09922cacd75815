//! Shared tail of the webhook processing paths.
//!
//! Both ingress handlers acknowledge the provider with a 200 before any
//! verification or reconciliation runs; providers retry aggressively on
//! non-2xx or slow responses, and retries are idempotent inputs to the
//! reconcile chokepoint anyway. Everything that happens after the ack is
//! fire-and-forget from the provider's perspective: failures are logged,
//! never surfaced.

use crate::db::AppState;
use crate::error::AppError;
use crate::models::PaymentRecord;
use crate::reconcile::{ReconcileOutcome, reconcile};

/// Apply a final-success record to the attributed user's entitlement.
///
/// `AlreadyReconciled` is the expected common case here (a webhook
/// confirming what the capture path already recorded, or a duplicate
/// delivery) and is logged distinctly from a fresh grant. A user that
/// doesn't resolve is an orphaned payment: money collected with no
/// entitlement target, which needs manual intervention - logged as an
/// operational alert, never retried.
pub async fn apply_final_payment(state: &AppState, user_id: &str, record: PaymentRecord) {
    let mut conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("DB connection error during webhook reconcile: {}", e);
            return;
        }
    };

    match reconcile(&mut conn, user_id, &record) {
        Ok(ReconcileOutcome::Granted) => {
            // reconcile logs the grant itself
        }
        Ok(ReconcileOutcome::AlreadyReconciled) => {
            tracing::info!(
                "Payment already reconciled: provider={}, payment_id={}",
                record.provider,
                record.payment_id
            );
        }
        Err(AppError::NotFound(_)) => {
            tracing::error!(
                "Orphaned payment: no user '{}' for {} payment {}",
                user_id,
                record.provider,
                record.payment_id
            );
        }
        Err(e) => {
            // Persistence failures are recoverable via provider redelivery
            // or the client re-confirming capture.
            tracing::error!(
                "Reconciliation failed for {} payment {}: {}",
                record.provider,
                record.payment_id,
                e
            );
        }
    }
}
