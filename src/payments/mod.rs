pub mod mercadopago;
pub mod paypal;

pub use mercadopago::{MercadoPagoClient, MpPayment, MpWebhookEvent};
pub use paypal::{PayPalClient, PayPalWebhookEvent, PpOrder, VerificationHeaders};

use std::time::Duration;

use crate::error::{AppError, Result};

/// Bound on every provider API round-trip. A hung provider call must not
/// hang the synchronous capture-confirmation path.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Convert a provider decimal amount string (e.g. "10.00") to cents.
///
/// Tolerates zero to two fractional digits; anything else is rejected rather
/// than silently truncated.
pub fn cents_from_decimal_str(value: &str) -> Option<i64> {
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };

    let whole: i64 = whole.parse().ok()?;
    let frac_cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        2 => frac.parse().ok()?,
        _ => return None,
    };

    if whole < 0 {
        return None;
    }
    Some(whole * 100 + frac_cents)
}

/// Render cents as a provider decimal amount string (e.g. 500 -> "5.00").
pub fn decimal_str_from_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}
