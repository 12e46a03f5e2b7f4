//! reqmetrics gateway
//!
//! Serves the demo routes (`/fast`, `/slow`), `/healthz`, and the metrics
//! endpoint, with every request instrumented by the interceptor chain.
//! Config comes from `$REQMETRICS_CONFIG` or `reqmetrics.yaml`; `$PORT`
//! overrides the listen port.

use std::process::ExitCode;

use tokio::time::Duration;

use reqmetrics_core::error::{MetricsError, Result};
use reqmetrics_gateway::{app_state, config, demo, obs, router};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, class = e.class().as_str(), "reqmetrics-gateway failed");
            eprintln!("reqmetrics-gateway: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    // Config (strict parsing + validate)
    let cfg = config::load()?;
    obs::logging::init(&cfg.logging);

    let port = std::env::var(config::PORT_ENV).ok();
    let listen = cfg.server.listen_addr(port.as_deref())?;
    let sampler_every = cfg
        .sampler
        .enabled
        .then(|| Duration::from_millis(cfg.sampler.interval_ms));

    let state = app_state::AppState::new(cfg)?;
    if let Some(every) = sampler_every {
        obs::sampler::spawn(state.process(), every);
    }
    let app = router::build_router_with(state, demo::routes())?;

    tracing::info!(%listen, "reqmetrics-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| MetricsError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MetricsError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
