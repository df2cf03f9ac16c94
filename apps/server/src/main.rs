use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tasklane_api::{build_router, AppState};
use tasklane_config::{load as load_config, load_from, AppConfig};
use tasklane_runtime::{shutdown_signal, telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "tasklane-server")]
#[command(about = "Tasklane backend (serves HTTP by default)")]
struct Cli {
    /// Configuration file, overriding TASKLANE_CONFIG and the search path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = match cli.config.as_deref() {
        Some(path) => load_from(Some(path)),
        None => load_config(),
    }
    .context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Migrate => migrate(config).await,
    }
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    info!("starting Tasklane backend");

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let state = AppState::new(services.authenticator.clone(), services.tasks.clone());
    let app = build_router(state, &config.http);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    services.db_pool.close().await;
    info!("backend shut down");
    Ok(())
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to apply migrations")?;

    services.db_pool.close().await;
    info!(database = %config.database.url, "database is up to date");
    Ok(())
}
