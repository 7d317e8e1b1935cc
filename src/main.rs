//! AlertHub Server: urgent escalating notification engine.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use alerthub_api::{AppState, build_app};
use alerthub_core::config::logging::LogFormat;
use alerthub_core::config::{AppConfig, StoreBackend};
use alerthub_core::error::AppError;
use alerthub_core::{Clock, SystemClock};
use alerthub_database::{DatabasePool, MemoryStore, Stores};
use alerthub_delivery::DeliveryDispatcher;
use alerthub_delivery::channels::InAppChannel;
use alerthub_service::{
    AcknowledgmentTracker, ComplianceReporter, EscalationEngine, NotificationService,
    ServiceDeps, StaticDirectory,
};
use alerthub_worker::{EscalationRunner, SweepScheduler};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("ALERTHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting AlertHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Persistence ──────────────────────────────────────
    let (stores, db_pool) = match config.database.backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = DatabasePool::connect(&config.database).await?;

            tracing::info!("Running database migrations...");
            alerthub_database::migration::run_migrations(pool.pool()).await?;
            tracing::info!("Database migrations complete");

            (Stores::postgres(pool.pool().clone()), Some(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; state is lost on restart");
            (Stores::memory(MemoryStore::new()), None)
        }
    };

    // ── Step 2: Collaborators ────────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let directory = Arc::new(StaticDirectory::load(&config.directory.roster_path)?);
    let (dispatcher, in_app) = DeliveryDispatcher::from_config(&config.delivery, clock.clone());
    tracing::info!(
        channels = ?dispatcher.registered_channels(),
        "Delivery channels registered"
    );
    let dispatcher = Arc::new(dispatcher);
    spawn_in_app_logger(&in_app);

    // ── Step 3: Services ─────────────────────────────────────────
    let deps = ServiceDeps::new(
        stores.clone(),
        directory,
        clock.clone(),
        config.escalation.conflict_retries,
    );
    let engine = Arc::new(EscalationEngine::new(
        deps.clone(),
        dispatcher.clone(),
        config.escalation.clone(),
    ));
    let notifications = Arc::new(NotificationService::new(
        deps.clone(),
        dispatcher,
        engine.clone(),
        config.escalation.default_expiry_hours,
    ));
    let tracker = Arc::new(AcknowledgmentTracker::new(deps.clone()));
    let reporter = Arc::new(ComplianceReporter::new(
        deps.clone(),
        config.compliance.clone(),
    ));

    // ── Step 4: Shutdown channel, runner and sweeps ──────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let runner_handle = if config.escalation.enabled {
        let worker_id = format!("runner-{}", std::process::id());
        let runner = EscalationRunner::new(
            stores.tasks.clone(),
            engine.clone(),
            clock,
            config.escalation.clone(),
            worker_id,
        );
        let cancel = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            runner.run(cancel).await;
        }))
    } else {
        tracing::warn!("Escalation runner disabled; escalation timers will not fire");
        None
    };

    let scheduler = SweepScheduler::new(
        notifications.clone(),
        deps.locks.clone(),
        config.escalation.clone(),
    )
    .await?;
    scheduler.register_default_tasks().await?;
    scheduler.start().await?;

    // ── Step 5: HTTP server ──────────────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let mut state = AppState::new(config, notifications, tracker, engine, reporter);
    if let Some(pool) = &db_pool {
        state = state.with_database(pool.clone());
    }
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("AlertHub server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 6: Drain ────────────────────────────────────────────
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Sweep scheduler did not shut down cleanly");
    }
    if let Some(handle) = runner_handle
        && tokio::time::timeout(grace, handle).await.is_err()
    {
        tracing::warn!("Escalation runner did not stop within the grace period");
    }
    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("AlertHub server stopped");
    Ok(())
}

/// Log in-app events at debug level so local runs show what clients would see.
fn spawn_in_app_logger(in_app: &InAppChannel) {
    let mut events = in_app.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::debug!(
                    user_id = %event.user_id,
                    notification_id = %event.message.notification_id,
                    priority = %event.message.priority,
                    "In-app message"
                ),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "In-app logger lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
