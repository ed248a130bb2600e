mod config;
mod console;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use matti_db::Ledger;
use matti_game::{Game, upload::parse_category_lines};
use matti_state::StateStore;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matti=info,matti_db=info,matti_game=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::from_env()?;

    // Init database
    let ledger = Arc::new(Ledger::open(&config.db_path)?);
    if let Some(path) = &config.seed_file {
        let content = tokio::fs::read_to_string(path).await?;
        let seeds = parse_category_lines(&content);
        let ledger = ledger.clone();
        let loaded = tokio::task::spawn_blocking(move || ledger.load_categories(&seeds)).await??;
        info!("Seeded {} categories from {}", loaded, path.display());
    }

    let game = Game::new(ledger.clone(), StateStore::new(), config.game());
    info!("Matti ready, moderator is {}", config.moderator_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut inflight = JoinSet::new();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => {
                    let game = game.clone();
                    inflight.spawn(dispatch(game, line));
                }
                Ok(None) => {
                    info!("Input closed, shutting down...");
                    break;
                }
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            },
            // Reap finished requests as we go
            Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                if let Err(e) = joined {
                    error!("Request task failed: {}", e);
                }
            }
        }
    }

    while let Some(joined) = inflight.join_next().await {
        if let Err(e) = joined {
            error!("Request task failed: {}", e);
        }
    }

    game.shutdown();
    drop(game);
    match Arc::try_unwrap(ledger) {
        Ok(ledger) => ledger.close()?,
        Err(_) => warn!("Ledger still shared at shutdown, leaving it to drop"),
    }
    Ok(())
}

/// Parse one console line, run it on a blocking thread and print the outcome
/// as a JSON line.
async fn dispatch(game: Game, line: String) {
    let (chat, command) = match console::parse_line(&line) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Rejected input {:?}: {}", line, e);
            println!("{}", serde_json::json!({ "error": e.to_string() }));
            return;
        }
    };

    let result = tokio::task::spawn_blocking(move || command.run(&game, chat)).await;
    let output = match result {
        Ok(Ok(outcome)) => serde_json::json!({ "chat": chat, "outcome": outcome }),
        Ok(Err(e)) => {
            error!("Request from {} failed: {:#}", chat, e);
            serde_json::json!({ "chat": chat, "error": e.to_string() })
        }
        Err(e) => {
            error!("spawn_blocking join error: {}", e);
            serde_json::json!({ "chat": chat, "error": "internal error" })
        }
    };
    println!("{}", output);
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
            },
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
