//! tidepool — reconciliation engine service
//!
//! Long-running service that:
//! - Receives payment-provider webhooks (signature-verified, deduplicated)
//! - Keeps order/payment/stock state consistent through legal transitions
//! - Detects and processes no-show pickups on a schedule
//! - Executes typed recovery strategies for reported failures

use tidepool::{api, services, AppState, Config};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tidepool=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting tidepool (env: {})", config.environment);

    // Initialize application state
    let state = AppState::new(&config).await?;

    // Periodic no-show scan
    if config.no_show_scan_secs > 0 {
        let scan_state = state.clone();
        let period = std::time::Duration::from_secs(config.no_show_scan_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let now = chrono::Utc::now().timestamp_millis();
                if let Err(e) = services::no_show::scan_due_orders(&scan_state, now).await {
                    tracing::error!(error = %e, "No-show scan pass failed");
                }
            }
        });
    } else {
        tracing::warn!("No-show scanner disabled (NO_SHOW_SCAN_SECS=0)");
    }

    // Serve HTTP
    let app = api::create_router(state);
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("tidepool listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
