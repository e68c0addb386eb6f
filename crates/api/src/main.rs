use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use studio_core::controller::{LifecycleController, PersistenceMode};
use studio_core::source::{CatalogSource, MemoryCatalogSource, MemoryProjectSource, ProjectSource};
use studio_db::kv::FileKeyValueStore;
use studio_db::sources::{PgCatalogSource, PgProjectSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studio_api::config::ServerConfig;
use studio_api::engagement::EngagementRegistry;
use studio_api::router::build_app_router;
use studio_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "studio_api=debug,studio_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        demo_mode = config.demo_mode,
        "Loaded server configuration"
    );

    // --- Data sources ---
    let (pool, primary, catalog): (_, Arc<dyn ProjectSource>, Arc<dyn CatalogSource>) =
        match std::env::var("DATABASE_URL") {
            Ok(database_url) => {
                let pool = studio_db::create_pool(&database_url)
                    .await
                    .expect("Failed to connect to database");
                tracing::info!("Database connection pool created");

                studio_db::health_check(&pool)
                    .await
                    .expect("Database health check failed");
                studio_db::run_migrations(&pool)
                    .await
                    .expect("Failed to run database migrations");
                tracing::info!("Database migrations applied");

                (
                    Some(pool.clone()),
                    Arc::new(PgProjectSource::new(pool.clone())),
                    Arc::new(PgCatalogSource::new(pool)),
                )
            }
            Err(_) => {
                tracing::warn!("DATABASE_URL not set, serving the demo dataset");
                (
                    None,
                    Arc::new(MemoryProjectSource::new(studio_db::seed::demo_projects())),
                    Arc::new(MemoryCatalogSource::new(studio_db::seed::demo_catalog())),
                )
            }
        };

    let mode = if config.demo_mode || pool.is_none() {
        PersistenceMode::Demo
    } else {
        PersistenceMode::Live
    };
    tracing::info!(?mode, "Project persistence mode");

    // --- Controller ---
    let fallback = Arc::new(MemoryProjectSource::new(studio_db::seed::demo_projects()));
    let controller = LifecycleController::new(primary, mode)
        .with_fallback(fallback)
        .with_persist_timeout(config.persist_timeout());

    // --- Engagement ---
    let engagement_store = FileKeyValueStore::new(config.engagement_dir.clone());
    tracing::info!(dir = %engagement_store.dir().display(), "Engagement store ready");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        controller: Arc::new(controller),
        catalog,
        engagement: Arc::new(EngagementRegistry::new(Arc::new(engagement_store))),
    };
    let controller = Arc::clone(&state.controller);

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            tracing::error!(?result, "Server exited unexpectedly");
            return;
        }
        () = shutdown_signal() => {}
    }
    let _ = stop_tx.send(());

    // --- Drain ---
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    match tokio::time::timeout(drain, server).await {
        Ok(Ok(Ok(()))) => tracing::info!("Server stopped accepting connections"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Server error during shutdown"),
        Ok(Err(e)) => tracing::error!(error = %e, "Server task failed"),
        Err(_) => tracing::warn!(secs = drain.as_secs(), "Shutdown drain timed out"),
    }

    let unsynced = controller.unsynced_ids().await;
    if !unsynced.is_empty() {
        tracing::warn!(count = unsynced.len(), ids = ?unsynced, "Exiting with unsynced project changes");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
