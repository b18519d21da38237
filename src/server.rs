// src/server.rs

use anyhow::Result;
use flight_optimizer::http::{serve, AppState};
use flight_optimizer::Config;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging; JSON to daily files when a log directory is configured
fn init_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,flight_optimizer=debug"));

    match &config.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let file_appender =
                tracing_appender::rolling::daily(log_dir, "flight-optimizer-server.log");
            let (writer, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true)
                        .json(),
                )
                .init();

            info!(log_dir = %log_dir.display(), "Logging initialized");
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    let _guard = init_logging(&config)?;
    debug!(
        bind_addr = %config.bind_addr,
        tequila_base = %config.tequila_base,
        "Configuration loaded"
    );

    let state = AppState::from_config(&config)?;
    serve(config.bind_addr, state).await?;

    info!("Server stopped");
    Ok(())
}
