//! Escalation engine and background sweep configuration.

use serde::{Deserialize, Serialize};

/// Settings for the escalation task runner and the periodic sweeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Whether the background runner is started.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of escalation tasks fired concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in seconds between polls for due tasks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Maximum tasks claimed per poll.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Seconds after which a running task is considered abandoned and reclaimed.
    #[serde(default = "default_lease")]
    pub task_lease_seconds: i64,
    /// First retry delay after a failed fire, in seconds.
    #[serde(default = "default_retry_base")]
    pub retry_base_seconds: i64,
    /// Upper bound of the retry delay, in seconds.
    #[serde(default = "default_retry_max")]
    pub retry_max_seconds: i64,
    /// Attempts at an optimistic write before giving up on a request.
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,
    /// Expiry applied when a notification is created without `expires_at`.
    #[serde(default = "default_expiry_hours")]
    pub default_expiry_hours: i64,
    /// Cron expression for the expiry / scheduled-send sweep.
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
    /// Cron expression for the privacy redaction sweep.
    #[serde(default = "default_redaction_cron")]
    pub redaction_cron: String,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
            poll_interval_seconds: default_poll_interval(),
            batch_size: default_batch_size(),
            task_lease_seconds: default_lease(),
            retry_base_seconds: default_retry_base(),
            retry_max_seconds: default_retry_max(),
            conflict_retries: default_conflict_retries(),
            default_expiry_hours: default_expiry_hours(),
            sweep_cron: default_sweep_cron(),
            redaction_cron: default_redaction_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    8
}

fn default_poll_interval() -> u64 {
    5
}

fn default_batch_size() -> u32 {
    32
}

fn default_lease() -> i64 {
    300
}

fn default_retry_base() -> i64 {
    15
}

fn default_retry_max() -> i64 {
    600
}

fn default_conflict_retries() -> u32 {
    5
}

fn default_expiry_hours() -> i64 {
    24
}

fn default_sweep_cron() -> String {
    "*/30 * * * * *".to_string()
}

fn default_redaction_cron() -> String {
    "0 0 * * * *".to_string()
}
