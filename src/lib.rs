//! Saludo - backend for personalized greeting pages with a paid PRO tier
//!
//! This library provides the payment core of the Saludo backend: provider
//! adapters (MercadoPago, PayPal), webhook ingress, the reconciliation engine
//! that grants PRO entitlements, and the HTTP handlers around them.

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod reconcile;
