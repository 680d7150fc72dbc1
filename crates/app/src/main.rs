use std::sync::Arc;

use chrono_tz::Tz;
use engine::{Engine, FileStore};
use tokio::sync::Mutex;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "carteira={level},chat_bot={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let timezone: Tz = settings
        .app
        .timezone
        .parse()
        .map_err(|err| format!("invalid timezone {}: {err}", settings.app.timezone))?;

    tracing::info!("Loading data from {}...", settings.app.data_dir.display());
    let engine = Engine::builder()
        .store(FileStore::new(&settings.app.data_dir))
        .timezone(timezone)
        .build()?;
    let engine = Arc::new(Mutex::new(engine));

    if let Some(server) = settings.server {
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let bind = server.bind.unwrap_or_else(|| "0.0.0.0".to_string());
            server::run(&bind, server.port).await;
        });
    }

    if let Some(telegram) = settings.telegram {
        let engine = engine.clone();
        tasks.spawn(async move {
            tracing::info!("Found telegram settings...");
            let mut builder = chat_bot::Bot::builder()
                .token(&telegram.token)
                .engine(engine);
            if let Some(owner) = telegram.owner_id {
                builder = builder.owner(owner);
            }
            match builder.build() {
                Ok(bot) => bot.run().await,
                Err(err) => tracing::error!("failed to initialize telegram bot: {err}"),
            }
        });
    }

    if tasks.is_empty() {
        tracing::warn!("Neither [telegram] nor [server] is configured, nothing to run");
    } else {
        tasks.spawn(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {err}");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down...");
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    engine.lock().await.flush()?;
    Ok(())
}
