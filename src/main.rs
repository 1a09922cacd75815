use axum::{Router, routing::get};
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saludo::config::Config;
use saludo::crypto;
use saludo::db::{AppState, create_pool, init_db, queries};
use saludo::handlers;
use saludo::models::CreateUser;
use saludo::payments::{MercadoPagoClient, PayPalClient};

#[derive(Parser, Debug)]
#[command(name = "saludo")]
#[command(about = "Backend for personalized greeting pages with a paid PRO tier")]
struct Cli {
    /// Seed the database with a demo user (dev mode only)
    #[arg(long)]
    seed: bool,
}

/// Seeds a demo user and prints its API token for local testing.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let count = queries::count_users(&conn).expect("Failed to count users");
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    let token = crypto::generate_token();
    let user = queries::create_user(
        &conn,
        &CreateUser {
            email: "demo@saludo.local".to_string(),
            name: "Demo User".to_string(),
        },
        &crypto::hash_token(&token),
    )
    .expect("Failed to create demo user");

    tracing::info!("============================================");
    tracing::info!("DEMO USER SEEDED");
    tracing::info!("Email: {}", user.email);
    tracing::info!("User ID: {}", user.id);
    tracing::info!("API Token: {}", token);
    tracing::info!("============================================");
    tracing::info!("SAVE THIS TOKEN - IT WILL NOT BE SHOWN AGAIN");
}

async fn health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saludo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    // Provider clients fail fast here on bad credentials rather than on the
    // first checkout. An absent config just disables that provider.
    let mercadopago = config
        .mercadopago
        .as_ref()
        .map(|c| MercadoPagoClient::new(c).expect("Invalid MercadoPago configuration"));
    let paypal = config
        .paypal
        .as_ref()
        .map(|c| PayPalClient::new(c).expect("Invalid PayPal configuration"));

    match (&mercadopago, &paypal) {
        (None, None) => tracing::warn!("No payment provider configured - checkout is disabled"),
        _ => {
            if mercadopago.is_some() {
                tracing::info!("MercadoPago provider enabled");
            }
            if paypal.is_some() {
                tracing::info!("PayPal provider enabled");
            }
        }
    }

    let state = AppState {
        db: db_pool,
        base_url: config.base_url.clone(),
        dev_mode: config.dev_mode,
        pro_price_cents: config.pro_price_cents,
        pro_currency: config.pro_currency.clone(),
        mercadopago,
        paypal,
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set SALUDO_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = Router::new()
        .route("/health", get(health))
        .merge(handlers::router(state.clone()))
        .merge(handlers::webhooks::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server error");
}
