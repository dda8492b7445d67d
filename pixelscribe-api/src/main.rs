//! # PixelScribe API Server
//!
//! Credit-gated gateway to the ClipDrop image API, plus the PixelBot chat
//! endpoints.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (and `.env`)
//! 2. Connect to PostgreSQL and apply migrations
//! 3. Build the document index from `SEARCH_ROOTS`
//! 4. Serve until Ctrl-C / SIGTERM
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p pixelscribe-api
//! ```

use std::sync::Arc;

use pixelscribe_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use pixelscribe_shared::{
    credits::PgLedger,
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    search::DocIndex,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "pixelscribe_api=debug,pixelscribe_shared=info,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    match LogFormat::from_env() {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "PixelScribe API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    let roots = config.search.roots.clone();
    let docs = tokio::task::spawn_blocking(move || DocIndex::build(&roots)).await?;

    if config.openai.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set, PixelBot will answer locally");
    }

    let bind_address = config.bind_address();
    let ledger = Arc::new(PgLedger::new(pool.clone()));
    let state = AppState::new(pool.clone(), config, ledger, docs)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}
