//! Escalation runner: main loop that claims due escalation tasks and fires them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;
use tokio::time;

use alerthub_core::Clock;
use alerthub_core::config::escalation::EscalationConfig;
use alerthub_core::result::AppResult;
use alerthub_database::repositories::EscalationTaskStore;
use alerthub_service::EscalationEngine;
use alerthub_service::escalation::FireOutcome;

/// Polls the task store and fires due escalation tasks.
#[derive(Debug)]
pub struct EscalationRunner {
    /// Durable escalation timers
    tasks: Arc<dyn EscalationTaskStore>,
    /// Engine that applies a fired task
    engine: Arc<EscalationEngine>,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Runner configuration
    config: EscalationConfig,
    /// Runner identifier, for logs
    worker_id: String,
}

impl EscalationRunner {
    /// Create a new escalation runner
    pub fn new(
        tasks: Arc<dyn EscalationTaskStore>,
        engine: Arc<EscalationEngine>,
        clock: Arc<dyn Clock>,
        config: EscalationConfig,
        worker_id: String,
    ) -> Self {
        Self {
            tasks,
            engine,
            clock,
            config,
            worker_id,
        }
    }

    /// Start the runner; runs until the cancel signal is received
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            worker_id = %self.worker_id,
            concurrency = self.config.concurrency,
            poll_interval_seconds = self.config.poll_interval_seconds,
            "Escalation runner started"
        );

        let concurrency = self.config.concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds.max(1));

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!(worker_id = %self.worker_id, "Escalation runner received shutdown signal");
                        break;
                    }
                }
                result = self.poll(&semaphore) => {
                    if let Err(e) = result {
                        tracing::error!(worker_id = %self.worker_id, error = %e, "Failed to claim escalation tasks");
                    }
                    tokio::select! {
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                tracing::info!(worker_id = %self.worker_id, "Escalation runner shutting down");
                                break;
                            }
                        }
                        _ = time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        tracing::info!(worker_id = %self.worker_id, "Waiting for in-flight escalations to complete");

        let max_permits = u32::try_from(concurrency).unwrap_or(u32::MAX);
        let _ = time::timeout(Duration::from_secs(30), semaphore.acquire_many(max_permits)).await;

        tracing::info!(worker_id = %self.worker_id, "Escalation runner shut down complete");
    }

    /// Claim as many due tasks as there are free slots and fire each on its
    /// own task, then fill the remaining slots with escalations whose
    /// dispatch was interrupted. Returns the handles of the spawned work.
    pub async fn poll(&self, semaphore: &Arc<Semaphore>) -> AppResult<Vec<JoinHandle<()>>> {
        let Some(limit) = self.free_slots(semaphore) else {
            tracing::trace!("All escalation slots occupied, waiting...");
            return Ok(Vec::new());
        };

        let now = self.clock.now();
        let lease_cutoff = now - chrono::Duration::seconds(self.config.task_lease_seconds);
        let claimed = self.tasks.claim_due(now, lease_cutoff, limit).await?;
        if claimed.is_empty() {
            tracing::trace!("No escalation tasks due");
        }

        let mut handles = Vec::with_capacity(claimed.len());
        for task in claimed {
            let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                // The lease returns the task to the pool later.
                tracing::warn!(task_id = %task.id, "No free slot for claimed escalation task");
                break;
            };
            let engine = Arc::clone(&self.engine);

            handles.push(tokio::spawn(async move {
                let _permit = permit;

                tracing::debug!(
                    task_id = %task.id,
                    notification_id = %task.notification_id,
                    target_level = task.target_level,
                    attempt = task.attempts + 1,
                    "Firing escalation task"
                );

                match engine.fire(&task).await {
                    Ok(FireOutcome::Escalated(outcome)) => {
                        tracing::debug!(
                            task_id = %task.id,
                            escalation_id = %outcome.escalation.id,
                            "Escalation task completed"
                        );
                    }
                    Ok(FireOutcome::Skipped(_)) => {}
                    Err(e) => {
                        if let Err(defer_err) = engine.defer(&task, &e).await {
                            tracing::error!(
                                task_id = %task.id,
                                error = %defer_err,
                                "Failed to reschedule escalation task; the lease will reclaim it"
                            );
                        }
                    }
                }
            }));
        }

        let Some(limit) = self.free_slots(semaphore) else {
            return Ok(handles);
        };
        for escalation in self.engine.claim_interrupted(limit).await? {
            let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                tracing::warn!(
                    escalation_id = %escalation.id,
                    "No free slot for interrupted escalation"
                );
                break;
            };
            let engine = Arc::clone(&self.engine);

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let escalation_id = escalation.id;
                if let Err(e) = engine.redeliver(escalation).await {
                    tracing::error!(
                        escalation_id = %escalation_id,
                        error = %e,
                        "Failed to redeliver escalation; the lease will reclaim it"
                    );
                }
            }));
        }
        Ok(handles)
    }

    /// Free slots capped at the batch size, or `None` when all are taken.
    fn free_slots(&self, semaphore: &Semaphore) -> Option<u32> {
        let free = semaphore.available_permits();
        (free > 0).then(|| {
            self.config
                .batch_size
                .min(u32::try_from(free).unwrap_or(u32::MAX))
        })
    }
}
