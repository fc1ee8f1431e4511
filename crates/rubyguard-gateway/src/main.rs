//! rubyguard gateway
//!
//! - Config: `RUBYGUARD_CONFIG` (default `rubyguard.yaml`), strict parsing
//! - `POST /v1/check/:profile` with a JSON syntax tree
//! - `/healthz`, `/readyz`, `/metrics`
//! - Ctrl-C flips readiness to draining, then shuts down gracefully

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use rubyguard_gateway::{app_state::AppState, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "rubyguard-gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::var("RUBYGUARD_CONFIG").unwrap_or_else(|_| "rubyguard.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| format!("gateway.listen must be a valid SocketAddr: {e}"))?;

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "rubyguard-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            state.set_draining();
            tracing::info!("shutdown requested; draining");
        })
        .await?;

    Ok(())
}
