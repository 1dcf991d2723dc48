use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};

use super::{
    services::{export_state, health, metrics, not_found, start_export},
    state::AppState,
};
use crate::config::Config;
use crate::export::ReportExporter;
use crate::observability::Metrics;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/reports", post(start_export))
        .route("/api/v1/reports/{id}", get(export_state))
        .route("/operators/health", get(health))
        .route("/operators/metrics", get(metrics))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
}

/// Serve the API until Ctrl+C or SIGTERM.
///
/// `address` overrides `server.bind_addr`.
pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);
    let metrics = Arc::new(Metrics::new());

    info!(
        input = %config.ledger.input_dir.display(),
        output = %config.output.dir.display(),
        "Opening ledger and artifact storage"
    );
    let exporter = ReportExporter::from_config(&config, metrics)
        .map_err(|e| format!("Failed to open storage: {e}"))?;

    let pruner = tokio::spawn(prune_periodically(exporter.clone()));

    let app = router(AppState::new(config, exporter));

    let listener = TcpListener::bind(address).await?;
    info!(%address, "ReportBox API listening");

    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    pruner.abort();
    served?;
    Ok(())
}

async fn prune_periodically(exporter: ReportExporter) {
    let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
    // the first tick completes immediately
    ticker.tick().await;
    loop {
        ticker.tick().await;
        exporter.registry().prune_expired().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
