//! Cancellable sleeps

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleep for `duration` unless cancelled first.
///
/// Returns `true` when the full duration elapsed, `false` on cancellation.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel.cancelled() => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes() {
        let cancel = CancellationToken::new();
        assert!(sleep_or_cancel(Duration::from_secs(30), &cancel).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_unblocks_sleep() {
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        let sleeper =
            tokio::spawn(async move { sleep_or_cancel(Duration::from_secs(3600), &child).await });

        tokio::task::yield_now().await;
        cancel.cancel();
        assert!(!sleeper.await.unwrap());
    }

    #[tokio::test]
    async fn test_already_cancelled_returns_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!sleep_or_cancel(Duration::from_secs(3600), &cancel).await);
    }
}
