use std::env;

/// MercadoPago credentials and webhook secret.
///
/// `webhook_secret` is optional: when present, inbound webhook signatures are
/// verified; when absent, the ingress relies solely on re-fetching the
/// payment from the API (the payload is never trusted either way).
#[derive(Debug, Clone)]
pub struct MercadoPagoConfig {
    pub access_token: String,
    pub webhook_secret: Option<String>,
}

/// PayPal REST credentials plus the platform-issued webhook id used for
/// server-to-server signature verification.
#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    /// "sandbox" or "live"
    pub mode: String,
    pub webhook_id: String,
}

impl PayPalConfig {
    pub fn base_url(&self) -> &'static str {
        if self.mode == "live" {
            "https://api-m.paypal.com"
        } else {
            "https://api-m.sandbox.paypal.com"
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    pub dev_mode: bool,
    /// Fixed price of the PRO upgrade, in cents.
    pub pro_price_cents: i64,
    /// Lowercase ISO currency code for the PRO upgrade.
    pub pro_currency: String,
    pub mercadopago: Option<MercadoPagoConfig>,
    pub paypal: Option<PayPalConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("SALUDO_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let mercadopago = env::var("MP_ACCESS_TOKEN").ok().map(|access_token| {
            MercadoPagoConfig {
                access_token,
                webhook_secret: env::var("MP_WEBHOOK_SECRET").ok(),
            }
        });

        let paypal = match (env::var("PAYPAL_CLIENT_ID"), env::var("PAYPAL_CLIENT_SECRET")) {
            (Ok(client_id), Ok(client_secret)) => Some(PayPalConfig {
                client_id,
                client_secret,
                mode: env::var("PAYPAL_MODE").unwrap_or_else(|_| "sandbox".to_string()),
                webhook_id: env::var("PAYPAL_WEBHOOK_ID").unwrap_or_default(),
            }),
            _ => None,
        };

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "saludo.db".to_string()),
            base_url,
            dev_mode,
            pro_price_cents: env::var("PRO_PRICE_CENTS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(500),
            pro_currency: env::var("PRO_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or_else(|_| "usd".to_string()),
            mercadopago,
            paypal,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
