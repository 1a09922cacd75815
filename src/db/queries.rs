use chrono::Utc;
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CreateUser, Payment, PaymentRecord, User};

use super::from_row::{PAYMENT_COLS, USER_COLS, query_all, query_one};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

// ============ Users ============

pub fn create_user(conn: &Connection, input: &CreateUser, api_token_hash: &str) -> Result<User> {
    let id = gen_id();
    let ts = now();

    conn.execute(
        "INSERT INTO users (id, email, name, api_token_hash, is_pro, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
        params![&id, &input.email, &input.name, api_token_hash, ts],
    )?;

    Ok(User {
        id,
        email: input.email.clone(),
        name: input.name.clone(),
        is_pro: false,
        pro_expires_at: None,
        created_at: ts,
        updated_at: ts,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_token_hash(conn: &Connection, token_hash: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE api_token_hash = ?1", USER_COLS),
        &[&token_hash],
    )
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

// ============ Payments ============

/// Check whether a payment with any of the incoming identifying ids has
/// already been recorded for this provider.
///
/// Matches the incoming `payment_id` and `provider_order_id` against BOTH
/// stored id columns: a webhook-derived record and a capture-derived record
/// for the same real-world payment may carry the ids in different fields.
pub fn payment_already_recorded(conn: &Connection, record: &PaymentRecord) -> Result<bool> {
    // An absent order id must not match anything; NULL never equals ''.
    let order_id = record.provider_order_id.as_deref().unwrap_or("");

    let exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM payments
            WHERE provider = ?1
              AND (payment_id = ?2 OR payment_id = ?3
                   OR provider_order_id = ?2 OR provider_order_id = ?3)
         )",
        params![record.provider.as_str(), &record.payment_id, order_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Atomically append a payment record, returning true if this call inserted
/// it.
///
/// Uses INSERT OR IGNORE against UNIQUE(provider, payment_id) so two
/// near-simultaneous reconcile calls for the same payment cannot both
/// append. Returns false when the row already existed.
pub fn try_insert_payment(
    conn: &Connection,
    user_id: &str,
    record: &PaymentRecord,
) -> Result<bool> {
    let affected = conn.execute(
        "INSERT OR IGNORE INTO payments (
            id, user_id, provider, payment_id, provider_order_id,
            amount_cents, currency, status, status_detail,
            payment_method, payment_type,
            payer_email, payer_name, payer_id,
            approved_at, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            gen_id(),
            user_id,
            record.provider.as_str(),
            &record.payment_id,
            &record.provider_order_id,
            record.amount_cents,
            &record.currency,
            &record.status,
            &record.status_detail,
            &record.payment_method,
            &record.payment_type,
            &record.payer_email,
            &record.payer_name,
            &record.payer_id,
            record.approved_at,
            now(),
        ],
    )?;
    Ok(affected > 0)
}

/// Flip the PRO flag. `pro_expires_at` is explicitly cleared: this product
/// has only a perpetual PRO tier.
pub fn activate_pro(conn: &Connection, user_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET is_pro = 1, pro_expires_at = NULL, updated_at = ?1 WHERE id = ?2",
        params![now(), user_id],
    )?;
    Ok(())
}

/// Look up a stored payment by either of its provider-native ids.
pub fn get_payment_by_provider_id(
    conn: &Connection,
    provider: crate::models::Provider,
    id: &str,
) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM payments
             WHERE provider = ?1 AND (payment_id = ?2 OR provider_order_id = ?2)",
            PAYMENT_COLS
        ),
        &[&provider.as_str(), &id],
    )
}

pub fn list_payments_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Payment>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM payments WHERE user_id = ?1 ORDER BY created_at ASC",
            PAYMENT_COLS
        ),
        &[&user_id],
    )
}
