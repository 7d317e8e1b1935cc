//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use alerthub_core::config::AppConfig;
use alerthub_database::DatabasePool;
use alerthub_service::{
    AcknowledgmentTracker, ComplianceReporter, EscalationEngine, NotificationService,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Process start, for the health endpoint
    pub started_at: Instant,
    /// Postgres pool, probed by the health endpoint
    pub database: Option<DatabasePool>,

    // ── Services ─────────────────────────────────────────────
    /// Notification lifecycle manager
    pub notifications: Arc<NotificationService>,
    /// Acknowledgment tracker
    pub tracker: Arc<AcknowledgmentTracker>,
    /// Escalation engine
    pub engine: Arc<EscalationEngine>,
    /// Compliance reporter
    pub reporter: Arc<ComplianceReporter>,
}

impl AppState {
    /// Build the state from the wired services.
    pub fn new(
        config: AppConfig,
        notifications: Arc<NotificationService>,
        tracker: Arc<AcknowledgmentTracker>,
        engine: Arc<EscalationEngine>,
        reporter: Arc<ComplianceReporter>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
            database: None,
            notifications,
            tracker,
            engine,
            reporter,
        }
    }

    /// Attach the Postgres pool so health checks probe it.
    pub fn with_database(mut self, pool: DatabasePool) -> Self {
        self.database = Some(pool);
        self
    }
}
