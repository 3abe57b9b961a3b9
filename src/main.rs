mod browse;
mod config;
mod event;
mod login;
mod notion;
mod pool;
mod projection;
mod source;
mod text_utils;
mod ui;

use clap::Parser;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::notion::NotionSource;

/// Log to a file; the terminal belongs to the UI.
fn init_tracing(log_path: &Path, debug_log: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;
    let default_filter = if debug_log { "lyricsproj=debug,warn" } else { "lyricsproj=info,warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cfg = Config::parse();
    let settings = config::resolve(cfg, |k| std::env::var(k).ok())?;
    init_tracing(&settings.log_file, settings.debug_log)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %settings.config_path.display(),
        has_credentials = settings.credentials.is_complete(),
        "starting"
    );

    let source = NotionSource::new(settings.schema.clone());
    let result = ui::app::run(source, settings).await;

    // Print error if any, for better diagnostics
    if let Err(e) = &result {
        tracing::error!(error = %e, "exited with error");
        eprintln!("Error: {}", e);
    }
    result
}
