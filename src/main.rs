//! Stripe to Whop relay server binary.

use std::sync::Arc;

use stripe_whop_relay::adapters::http::{app_router, WebhookAppState};
use stripe_whop_relay::adapters::whop::{WhopConfig, WhopMembershipAdapter};
use stripe_whop_relay::application::handlers::relay::RelayEventHandler;
use stripe_whop_relay::config::AppConfig;
use stripe_whop_relay::domain::webhook::StripeWebhookVerifier;
use stripe_whop_relay::telemetry::init_telemetry;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration comes before logging so the log level is known.
    let config = match AppConfig::load_validated() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Missing or invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_telemetry(&config.server);

    match config.payment.stripe_api_key {
        Some(_) if config.payment.is_test_mode() => {
            tracing::info!("Stripe API key configured (test mode)")
        }
        Some(_) => tracing::info!("Stripe API key configured (live mode)"),
        None => tracing::info!("No Stripe API key configured; only webhook verification is used"),
    }

    let membership_api = Arc::new(WhopMembershipAdapter::new(WhopConfig::from(
        &config.membership,
    )));
    let relay_handler =
        RelayEventHandler::new(membership_api, config.membership.whop_product_id.clone());
    let verifier = StripeWebhookVerifier::new(config.payment.stripe_webhook_secret.clone())
        .with_tolerance(config.payment.signature_tolerance_secs);

    let app = app_router(WebhookAppState::new(verifier, relay_handler));

    let addr = config.server.resolve_addr().await?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
