use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initializes structured JSON logging. With `log_dir` set, logs rotate daily into that
/// directory (the teacher's `tracing_appender::rolling::daily` approach, pointed at a
/// configurable path instead of a Tauri-resolved app-data dir); otherwise logs go to stdout.
pub fn init_tracing(log_dir: Option<&std::path::Path>) -> anyhow::Result<()> {
  let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,reqwest=warn,hyper=warn"));

  let builder = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .json()
    .with_current_span(true)
    .with_span_list(true);

  if let Some(dir) = log_dir {
    std::fs::create_dir_all(dir)?;
    let file_appender = tracing_appender::rolling::daily(dir, "streamgate.jsonl");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);
    builder.with_writer(non_blocking).init();
  } else {
    builder.init();
  }

  Ok(())
}
