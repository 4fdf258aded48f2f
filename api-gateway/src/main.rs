//! Voixi Gateway binary

use tracing::info;
use tracing_subscriber::EnvFilter;
use voixi_gateway::{router, AppState, GatewayConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::load()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("voixi_gateway=info,voixi_metering=info,voixi_notify=info,tower_http=info")
    });
    if config.server.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let state = AppState::build(&config).await?;
    info!(
        ledger = state.gate.ledger().backend(),
        sms = state.dispatcher.backend(),
        fail_open = state.gate.fail_open(),
        "Admission gate ready"
    );

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Voixi Gateway starting on {}", addr);
    info!("Endpoints: /health, /metrics, /webhooks/twilio/*, /api/notify/*, /api/usage/:account, /api/calls");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Voixi Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
