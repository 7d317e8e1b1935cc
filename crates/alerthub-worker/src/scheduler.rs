//! Cron scheduler for the periodic sweeps.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use alerthub_core::config::escalation::EscalationConfig;
use alerthub_core::error::AppError;
use alerthub_service::{NotificationLocks, NotificationService};

/// Lock pruning runs every five minutes.
const LOCK_PRUNE_SCHEDULE: &str = "0 */5 * * * *";

/// Cron-based scheduler for the lifecycle sweeps
pub struct SweepScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Lifecycle manager the sweeps call into
    notifications: Arc<NotificationService>,
    /// Per-notification locks to prune
    locks: Arc<NotificationLocks>,
    /// Cron expressions and batch size
    config: EscalationConfig,
}

impl std::fmt::Debug for SweepScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepScheduler").finish()
    }
}

impl SweepScheduler {
    /// Create a new sweep scheduler
    pub async fn new(
        notifications: Arc<NotificationService>,
        locks: Arc<NotificationLocks>,
        config: EscalationConfig,
    ) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            notifications,
            locks,
            config,
        })
    }

    /// Register every sweep
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register_lifecycle_sweep().await?;
        self.register_redaction_sweep().await?;
        self.register_lock_pruning().await?;

        tracing::info!("All sweeps registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Sweep scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Sweep scheduler shut down");
        Ok(())
    }

    /// Scheduled sends and expiry
    async fn register_lifecycle_sweep(&self) -> Result<(), AppError> {
        let notifications = Arc::clone(&self.notifications);
        let limit = self.config.batch_size;
        let job = CronJob::new_async(self.config.sweep_cron.as_str(), move |_uuid, _lock| {
            let notifications = Arc::clone(&notifications);
            Box::pin(async move {
                lifecycle_sweep(&notifications, limit).await;
            })
        })
        .map_err(|e| schedule_error("lifecycle_sweep", &self.config.sweep_cron, e))?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add lifecycle_sweep schedule: {e}"))
        })?;

        tracing::info!(schedule = %self.config.sweep_cron, "Registered: lifecycle_sweep");
        Ok(())
    }

    /// Content redaction of closed notifications
    async fn register_redaction_sweep(&self) -> Result<(), AppError> {
        let notifications = Arc::clone(&self.notifications);
        let limit = self.config.batch_size;
        let job = CronJob::new_async(self.config.redaction_cron.as_str(), move |_uuid, _lock| {
            let notifications = Arc::clone(&notifications);
            Box::pin(async move {
                match notifications.redact_due(limit).await {
                    Ok(0) => tracing::trace!("No notifications due for redaction"),
                    Ok(count) => tracing::info!(count, "Redacted notification content"),
                    Err(e) => tracing::error!(error = %e, "Redaction sweep failed"),
                }
            })
        })
        .map_err(|e| schedule_error("redaction_sweep", &self.config.redaction_cron, e))?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add redaction_sweep schedule: {e}"))
        })?;

        tracing::info!(schedule = %self.config.redaction_cron, "Registered: redaction_sweep");
        Ok(())
    }

    /// Drop idle per-notification locks
    async fn register_lock_pruning(&self) -> Result<(), AppError> {
        let locks = Arc::clone(&self.locks);
        let job = CronJob::new_async(LOCK_PRUNE_SCHEDULE, move |_uuid, _lock| {
            let locks = Arc::clone(&locks);
            Box::pin(async move {
                let pruned = locks.prune();
                tracing::trace!(pruned, remaining = locks.len(), "Pruned notification locks");
            })
        })
        .map_err(|e| schedule_error("lock_pruning", LOCK_PRUNE_SCHEDULE, e))?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add lock_pruning schedule: {e}"))
        })?;

        tracing::info!("Registered: lock_pruning (every 5min)");
        Ok(())
    }
}

/// One pass of the scheduled-send and expiry sweep.
pub async fn lifecycle_sweep(notifications: &NotificationService, limit: u32) {
    match notifications.send_due_scheduled(limit).await {
        Ok(0) => {}
        Ok(count) => tracing::info!(count, "Sent scheduled notifications"),
        Err(e) => tracing::error!(error = %e, "Scheduled-send sweep failed"),
    }
    match notifications.expire_overdue(limit).await {
        Ok(0) => {}
        Ok(count) => tracing::info!(count, "Expired overdue notifications"),
        Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
    }
}

fn schedule_error(name: &str, schedule: &str, e: impl std::fmt::Display) -> AppError {
    AppError::configuration(format!("Invalid schedule '{schedule}' for {name}: {e}"))
}
