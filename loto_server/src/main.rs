//! Loto table server.
//!
//! Runs one table actor and serves it over HTTP and WebSocket until Ctrl+C.

use std::net::SocketAddr;

use anyhow::{Context, Error};
use log::{info, warn};
use loto::table::{TableActor, TableHandle};
use loto_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging, metrics,
};
use pico_args::Arguments;

const HELP: &str = "\
Run a shared loto table server

USAGE:
  loto_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --metrics-bind  IP:PORT  Prometheus listener address [default: env METRICS_BIND, disabled if unset]
  --seed          N        Fixed seed for number draws [default: env LOTO_RNG_SEED, random if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  LOTO_HOST_SECRET         Secret that grants the host seat (required, 8+ chars)
  LOTO_STARTING_BALANCE    Balance given to new players [default: 500]
  LOTO_NOTABLE_PURCHASE    Ticket price from which purchases are announced [default: 10]
  LOTO_TABLE_NAME          Table name shown in logs and /api/v1/state
  RUST_LOG                 Log filter [default: info]
  (See .env.example for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    metrics_bind: Option<SocketAddr>,
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        metrics_bind: pargs.opt_value_from_str("--metrics-bind")?,
        seed: pargs.opt_value_from_str("--seed")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {remaining:?}\n\n{HELP}");
    }

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.metrics_bind, args.seed)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        match metrics::init_metrics(addr) {
            Ok(()) => info!("Prometheus metrics at http://{addr}/metrics"),
            Err(e) => warn!("{e}; continuing without metrics"),
        }
    }

    info!(
        "Starting table '{}' (starting balance {}, seed {})",
        config.table.name,
        config.table.starting_balance,
        config
            .table
            .rng_seed
            .map_or_else(|| "random".to_string(), |s| s.to_string())
    );

    let (actor, table) = TableActor::new(config.table.clone());
    let actor_task = tokio::spawn(actor.run());

    let app = api::create_router(AppState {
        table: table.clone(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(table))
        .await
        .context("Server error")?;

    actor_task.await.context("Table actor panicked")?;
    info!("Server stopped");

    Ok(())
}

/// Graceful shutdown signal.
///
/// Closing the table drops every event channel, which ends open sockets.
async fn shutdown_signal(table: TableHandle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }

    info!("Shutting down server...");
    if table.close().await.is_err() {
        warn!("Table actor already stopped");
    }
}
