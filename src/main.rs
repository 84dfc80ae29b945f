//! Observation REST server.
//!
//! Loads configuration from the environment (and `.env`), seeds the in-memory store and
//! serves the REST API with Swagger UI.

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use obsrest_core::{CoreConfig, default_registry};
use obsrest_store::{MemoryStore, load_seed_file};

/// Main entry point for the observation service.
///
/// # Environment Variables
/// - `OBSREST_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `OBSREST_SEED`: optional YAML seed file loaded into the store at startup
/// - `OBSREST_BASE_URI`, `OBSREST_MAX_DEPTH`, `OBSREST_DEFAULT_LIMIT`, `OBSREST_MAX_LIMIT`,
///   `OBSREST_LOCALE`: engine configuration, see [`CoreConfig::from_lookup`]
///
/// # Errors
/// Returns an error if the configuration or seed file is invalid, the address cannot be
/// bound, or the server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("obsrest_run=info".parse()?)
                .add_directive("obsrest_store=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("OBSREST_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let config = CoreConfig::from_lookup(|name| std::env::var(name).ok())?;

    let store = match std::env::var("OBSREST_SEED").ok().filter(|v| !v.trim().is_empty()) {
        Some(path) => {
            let path = PathBuf::from(path);
            tracing::info!("-- Loading seed from {}", path.display());
            load_seed_file(&path)?
        }
        None => {
            tracing::warn!("OBSREST_SEED not set; starting with an empty store");
            MemoryStore::new()
        }
    };
    let store = Arc::new(store);

    let state = AppState::new(config, default_registry()?, store.services());
    let app = router(state);

    tracing::info!("++ Starting observation REST API on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
