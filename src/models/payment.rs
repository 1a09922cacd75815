use serde::{Deserialize, Serialize};

/// Payment provider discriminant.
///
/// `Simulation` exists for dev-mode end-to-end exercise of the entitlement
/// flow without touching a real provider; it is rejected outside dev mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    MercadoPago,
    PayPal,
    Simulation,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::MercadoPago => "mercadopago",
            Provider::PayPal => "paypal",
            Provider::Simulation => "simulation",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mercadopago" | "mp" => Ok(Provider::MercadoPago),
            "paypal" => Ok(Provider::PayPal),
            "simulation" => Ok(Provider::Simulation),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized, provider-agnostic payment record.
///
/// Produced only by a provider adapter's `normalize` step; nothing outside
/// the adapters ever sees provider-specific response shapes. `payment_id` is
/// the provider-native id of the specific payment/capture (never the
/// order/preference id); `provider_order_id` carries the higher-level order
/// id for cross-referencing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub provider_order_id: Option<String>,
    pub provider: Provider,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Lowercase ISO currency code.
    pub currency: String,
    /// Provider-native overall status.
    pub status: String,
    /// Finer-grained provider status, where the provider has one.
    pub status_detail: Option<String>,
    pub payment_method: Option<String>,
    pub payment_type: Option<String>,
    pub payer_email: Option<String>,
    pub payer_name: Option<String>,
    pub payer_id: Option<String>,
    /// Provider-side completion time (unix seconds).
    pub approved_at: Option<i64>,
}

/// A stored payment row: a `PaymentRecord` bound to a user, append-only.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub record: PaymentRecord,
    pub created_at: i64,
}

/// Result of creating a payment intent with a provider.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutIntent {
    pub provider_order_id: String,
    pub redirect_url: String,
}
