//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::{Payment, PaymentRecord, Provider, User};

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str =
    "id, email, name, is_pro, pro_expires_at, created_at, updated_at";

pub const PAYMENT_COLS: &str = "id, user_id, provider, payment_id, provider_order_id, \
     amount_cents, currency, status, status_detail, payment_method, payment_type, \
     payer_email, payer_name, payer_id, approved_at, created_at";

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            is_pro: row.get(3)?,
            pro_expires_at: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl FromRow for Payment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let provider: String = row.get(2)?;
        let provider = provider.parse::<Provider>().map_err(|_| {
            rusqlite::Error::InvalidColumnType(2, "provider".into(), rusqlite::types::Type::Text)
        })?;

        Ok(Payment {
            id: row.get(0)?,
            user_id: row.get(1)?,
            record: PaymentRecord {
                provider,
                payment_id: row.get(3)?,
                provider_order_id: row.get(4)?,
                amount_cents: row.get(5)?,
                currency: row.get(6)?,
                status: row.get(7)?,
                status_detail: row.get(8)?,
                payment_method: row.get(9)?,
                payment_type: row.get(10)?,
                payer_email: row.get(11)?,
                payer_name: row.get(12)?,
                payer_id: row.get(13)?,
                approved_at: row.get(14)?,
            },
            created_at: row.get(15)?,
        })
    }
}
