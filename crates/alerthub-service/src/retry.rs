//! Retry of optimistic-concurrency conflicts.

use std::future::Future;

use tracing::debug;

use alerthub_core::error::ErrorKind;
use alerthub_core::result::AppResult;

/// Run `op` again while it fails with `ErrorKind::Conflict`, up to `retries`
/// extra attempts.
pub async fn retry_on_conflict<T, F, Fut>(retries: u32, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(e) if e.kind == ErrorKind::Conflict && attempt < retries => {
                attempt += 1;
                debug!(attempt, error = %e, "Retrying after version conflict");
            }
            other => return other,
        }
    }
}
