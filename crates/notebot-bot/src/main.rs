//! notebot: note-taking Telegram bot.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notebot_bot::{App, BotConfig, MemorySessionStore, Poller};
use notebot_core::defaults;
use notebot_db::{Database, PoolConfig};
use notebot_telegram::TelegramClient;

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter
fn init_tracing() -> Option<WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "notebot_bot=debug,notebot_db=info,notebot_telegram=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = Path::new(path).parent().unwrap_or(Path::new("."));
        let file_name = Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("notebot.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            // No ANSI in files unless asked for.
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let config = BotConfig::from_env()?;
    info!(?config, "Configuration loaded");

    info!("Connecting to database...");
    let pool_config = PoolConfig::new().max_connections(config.database.max_connections);
    let db = Database::connect_with_config(&config.database.connection_url()?, pool_config).await?;
    info!("Connected to database");

    if config.run_migrations {
        info!("Running database migrations...");
        db.migrate().await?;
        info!("Migrations complete");
    }

    let client = TelegramClient::new(config.telegram.clone())?;
    if let Err(e) = client.set_my_commands(defaults::BOT_COMMANDS).await {
        error!(error = %e, "Failed to register bot commands");
    }

    let app = App::new(
        Arc::new(db),
        Arc::new(client.clone()),
        Arc::new(MemorySessionStore::new()),
    );
    let poller = Poller::new(client, app);

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = shutdown_tx.send(()).await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for shutdown signal");
                // Dropping the sender would stop the poller.
                std::future::pending::<()>().await;
            }
        }
    });

    poller.run(&mut shutdown_rx).await?;
    info!("notebot stopped");
    Ok(())
}
