//! pdbcurate web server
//!
//! Run with: cargo run -p pdbcurate-web -- --offline

use anyhow::Context;
use clap::Parser;
use pdbcurate_db::{PostgrestBackend, RecordBackend};
use pdbcurate_web::{build_router, demo, AppState, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "pdbcurate=info,tower_http=info";

#[derive(Debug, Parser)]
#[command(name = "pdbcurate-web", version, about = "Curate PDB records grouped by publication")]
struct Args {
    /// Path to pdbcurate.toml
    #[arg(long, env = "PDBCURATE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides `server.bind`
    #[arg(long)]
    bind: Option<String>,

    /// Serve bundled demo rows instead of the remote backend
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    let schema = config.schema()?;
    let bind = args.bind.clone().unwrap_or_else(|| config.server.bind.clone());

    info!(dataset = %schema.name, table = %schema.table, offline = args.offline, "Starting pdbcurate web server");

    let backend: Arc<dyn RecordBackend> = if args.offline {
        Arc::new(demo::demo_backend(&schema))
    } else {
        let api_key = config
            .backend
            .api_key
            .take()
            .context("backend API key missing: set backend.api_key or PDBCURATE_API_KEY")?;
        Arc::new(PostgrestBackend::new(&config.backend.url, api_key, config.backend.timeout())?)
    };

    if config.access.password.is_none() {
        warn!("No access password configured; the login gate is disabled");
    }

    let state = Arc::new(AppState::from_config(config, schema, backend)?);
    if let Err(e) = state.refresh().await {
        warn!(error = %e, "Initial fetch failed; the page will retry on load");
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {}", bind))?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
