//! # TaskHub API Server
//!
//! REST API for a multi-user task and project tracker. Users sign up, log in to receive
//! a session token, and manage only the tasks and projects they own.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=... cargo run -p taskhub-api
//! ```
//!
//! Without `DATABASE_URL` the server runs on the in-process store (development only).

use taskhub_api::{
    app::{build_router, AppState, Stores},
    config::Config,
};
use taskhub_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskhub_api=debug,taskhub_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("TaskHub API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    let (stores, pool) = match &config.database {
        Some(database) => {
            let pool = create_pool(database.clone()).await?;
            run_migrations(&pool).await?;
            (Stores::postgres(pool.clone()), Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data will not persist");
            (Stores::in_memory(), None)
        }
    };

    let state = AppState::new(config, stores)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}
