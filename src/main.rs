//! Binary entry point. Structurally the server-side half of the teacher's `lib.rs::run`
//! `setup` closure (load config, init logging, build shared state, start serving) minus the
//! Tauri app shell — there is no window or tray here, just a `tokio::main` process that serves
//! HTTP until it receives a shutdown signal.

use streamgate::config::Config;
use streamgate::{build_app_state, logging, router};
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = Config::from_env()?;
  logging::init_tracing(config.log_dir.as_deref().map(std::path::Path::new))?;

  tracing::info!(bind_addr = %config.bind_addr, "starting streamgate");

  let bind_addr = config.bind_addr.clone();
  let state = build_app_state(config).await?;
  let cancel = state.cancel.clone();
  let app = router(state);

  let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
  tracing::info!(%bind_addr, "listening");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal(cancel))
    .await?;

  Ok(())
}

async fn shutdown_signal(cancel: tokio_util::sync::CancellationToken) {
  let ctrl_c = async {
    signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
  };

  #[cfg(unix)]
  let terminate = async {
    signal::unix::signal(signal::unix::SignalKind::terminate())
      .expect("failed to install SIGTERM handler")
      .recv()
      .await;
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }

  tracing::info!("shutdown signal received, stopping background loops");
  cancel.cancel();
}
