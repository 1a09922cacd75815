mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::payments::{MercadoPagoClient, PayPalClient};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool, provider clients, and
/// request-independent configuration.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Base URL for provider callbacks (e.g. https://api.example.com)
    pub base_url: String,
    pub dev_mode: bool,
    /// Fixed PRO upgrade price in cents.
    pub pro_price_cents: i64,
    /// Lowercase ISO currency code for the PRO upgrade.
    pub pro_currency: String,
    /// Provider clients; None when the provider is not configured.
    pub mercadopago: Option<MercadoPagoClient>,
    pub paypal: Option<PayPalClient>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        // Concurrent reconciles serialize on the write lock; wait for it
        // instead of failing with SQLITE_BUSY.
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });
    Pool::builder().max_size(10).build(manager)
}
