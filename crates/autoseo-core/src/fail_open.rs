//! Fail-open helper for infrastructure side effects
//!
//! Journaling and other best-effort writes must never stop the optimization
//! loop. Collaborator calls (analysis, generation, publishing) are NOT
//! fail-open: their errors drive retry and circuit breaker decisions.

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Run a best-effort operation, logging and discarding any error
///
/// ```no_run
/// use autoseo_core::fail_open::fail_open;
/// use autoseo_core::Result;
///
/// async fn append_journal() -> Result<()> {
///     Ok(())
/// }
///
/// async fn example() {
///     let written = fail_open("activity_journal", || append_journal()).await;
///     assert!(written.is_some());
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}
