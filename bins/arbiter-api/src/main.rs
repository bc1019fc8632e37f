mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use arbiter_common::config::Config;
use arbiter_harness::{ExecutionBackend, ExecutionGateway, LanguageTable};
use axum::Router;
use metrics::MeteredBackend;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

pub struct AppState {
    pub backend: Arc<dyn ExecutionBackend>,
    pub languages: LanguageTable,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    warn!("Received shutdown signal, finishing in-flight submissions...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Arbiter API booting...");

    let config = Config::from_env().context("Invalid ARBITER_* configuration")?;
    let languages = LanguageTable::load_or_default(&config.languages_file)
        .context("Failed to load language configuration")?;
    let gateway = ExecutionGateway::new(&config).context("Failed to build execution gateway")?;

    info!(
        endpoint = %gateway.endpoint(),
        compile_timeout_ms = config.compile_timeout.as_millis() as u64,
        run_timeout_ms = config.run_timeout.as_millis() as u64,
        request_timeout_ms = config.request_timeout.as_millis() as u64,
        "Execution gateway configured"
    );

    let state = Arc::new(AppState {
        backend: Arc::new(MeteredBackend::new(gateway)),
        languages,
    });

    let app = Router::new().merge(routes::routes()).with_state(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("HTTP server listening on {}", config.bind_addr);
    info!("Ready to grade submissions");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("API shutdown complete");
    Ok(())
}
