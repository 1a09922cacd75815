use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Users: the entitlement record. is_pro flips false -> true at most
        -- once per real-world payment; pro_expires_at stays NULL (perpetual
        -- PRO) but is kept for forward compatibility.
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            api_token_hash TEXT NOT NULL UNIQUE,
            is_pro INTEGER NOT NULL DEFAULT 0,
            pro_expires_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_token ON users(api_token_hash);

        -- Payments: append-only audit log of reconciled payments.
        -- UNIQUE(provider, payment_id) is the idempotency backstop: a second
        -- reconcile for the same provider-native payment id cannot insert a
        -- second row regardless of interleaving.
        CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            provider TEXT NOT NULL CHECK (provider IN ('mercadopago', 'paypal', 'simulation')),
            payment_id TEXT NOT NULL,
            provider_order_id TEXT,
            amount_cents INTEGER NOT NULL,
            currency TEXT NOT NULL,
            status TEXT NOT NULL,
            status_detail TEXT,
            payment_method TEXT,
            payment_type TEXT,
            payer_email TEXT,
            payer_name TEXT,
            payer_id TEXT,
            approved_at INTEGER,
            created_at INTEGER NOT NULL,

            UNIQUE(provider, payment_id)
        );
        CREATE INDEX IF NOT EXISTS idx_payments_user ON payments(user_id);
        CREATE INDEX IF NOT EXISTS idx_payments_order ON payments(provider, provider_order_id);
        "#,
    )
}
