use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use appcatalog_core::{
    load_config, scrape::ScrapeSettings, store_page::Url, validate_config, BatchStatus, Database,
    ReqwestTransport, ScrapeRunner, SourceClient, StorePageFetcher,
};
use appcatalog_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("APPCATALOG_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Store: {} ({})", config.store.base_url, config.store.language);
    info!("Database path: {:?}", config.database.path);

    // Load the collection; a missing or unreadable file starts empty
    let mut database = match Database::load(&config.database.path) {
        Ok(db) => db,
        Err(e) => {
            warn!(
                "Could not load database from {:?} ({}), starting empty",
                config.database.path, e
            );
            Database::default()
        }
    };
    let stale = database.change_language(&config.store.language);
    if !stale.is_empty() {
        warn!(
            "Database language switched to {}; {} entries need a re-scrape",
            config.store.language,
            stale.len()
        );
    }
    info!("Database ready with {} entries", database.len());

    // Storefront client and scrape runner
    let transport = ReqwestTransport::new(&config.store)
        .map_err(|e| anyhow!("Failed to create store client: {}", e))?;
    let base_url = Url::parse(&config.store.base_url).context("Invalid store base URL")?;
    let fetcher = StorePageFetcher::new(Arc::new(transport), base_url);
    let runner = Arc::new(ScrapeRunner::new(
        Arc::new(fetcher),
        database.into_shared(),
        ScrapeSettings::from(&config.scrape),
    ));

    // Feed client is optional; feeds can also be posted directly
    let sources = match SourceClient::new(&config.sources) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            error!("Failed to create feed client: {}", e);
            None
        }
    };

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), runner, sources));

    // Create router
    let app = create_router(Arc::clone(&state));

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    // Stop batches so nothing merges after the final save
    for batch in state.batches().list().await {
        if batch.status == BatchStatus::Running {
            state.batches().cancel(batch.id).await;
        }
    }

    if config.database.save_on_shutdown {
        let db = state.database().read().await;
        db.save(&config.database.path)
            .with_context(|| format!("Failed to save database to {:?}", config.database.path))?;
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
