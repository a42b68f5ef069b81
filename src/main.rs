//! kvs-quiz · topic-scoped quiz backend
//!
//! - Axum HTTP API under /kvs/v1
//! - Sessions graded against the questions they were built from
//! - Bearer tokens checked by the identity service (or a static list for local runs)
//!
//! Configuration is read from the environment once, see `config.rs`.
//! Logging: LOG_LEVEL (tracing filter), LOG_FORMAT ("pretty" default or "json").

mod config;
mod domain;
mod error;
mod introspect;
mod protocol;
mod routes;
mod seeds;
mod service;
mod state;
mod storage;
mod telemetry;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = AppConfig::from_env()?;
  let state = Arc::new(AppState::from_config(&cfg)?);
  let app = build_router(state, cfg.request_timeout);

  let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "kvs_quiz", %addr, timeout = ?cfg.request_timeout, "HTTP server listening");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  info!(target: "kvs_quiz", "Server stopped gracefully");
  Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      warn!(target: "kvs_quiz", error = %e, "Failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        warn!(target: "kvs_quiz", error = %e, "Failed to listen for SIGTERM");
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
  info!(target: "kvs_quiz", "Shutdown signal received");
}
