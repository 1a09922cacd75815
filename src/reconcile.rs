//! Reconciliation engine: the single chokepoint that converts "a provider
//! says this payment is final-success" into an entitlement change, exactly
//! once.
//!
//! Both the webhook-driven flow and the synchronous capture-confirmation
//! flow call [`reconcile`]; neither duplicates the activation logic. Callers
//! must pass a record that already passed the provider's final-success
//! predicate - this module does not re-check provider state.

use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::error::{AppError, Result, msg};
use crate::models::PaymentRecord;

/// Outcome of a reconcile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Fresh grant: payment appended, PRO activated.
    Granted,
    /// The payment was already recorded; this call was a no-op. This is the
    /// expected common case (duplicate webhook, or a webhook racing a
    /// client-driven capture) and must render as success to callers.
    AlreadyReconciled,
}

/// Idempotently apply a final-success payment to the user's entitlement.
///
/// The idempotency check and the append-and-activate run inside a single
/// database transaction, so a concurrent reconcile for the same payment
/// serializes on the write lock and sees either the committed row (check
/// hit) or loses the INSERT OR IGNORE race (insert returns false). Failure
/// before commit leaves no partial state, so provider retries and client
/// re-confirmation are safe.
pub fn reconcile(
    conn: &mut Connection,
    user_id: &str,
    record: &PaymentRecord,
) -> Result<ReconcileOutcome> {
    // Immediate transaction: takes the write lock up front, so the
    // check-then-append sequence is the serialization point rather than an
    // upgrade-on-write that can fail midway.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let user = queries::get_user_by_id(&tx, user_id)?
        .ok_or_else(|| AppError::NotFound(msg::USER_NOT_FOUND.to_string()))?;

    if queries::payment_already_recorded(&tx, record)? {
        return Ok(ReconcileOutcome::AlreadyReconciled);
    }

    if !queries::try_insert_payment(&tx, &user.id, record)? {
        // Lost the insert race to a concurrent reconcile.
        return Ok(ReconcileOutcome::AlreadyReconciled);
    }

    queries::activate_pro(&tx, &user.id)?;
    tx.commit()?;

    tracing::info!(
        "PRO granted: user={}, provider={}, payment_id={}, order_id={:?}, amount={} {}",
        user.id,
        record.provider,
        record.payment_id,
        record.provider_order_id,
        record.amount_cents,
        record.currency
    );

    Ok(ReconcileOutcome::Granted)
}
