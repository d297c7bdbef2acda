use std::future::Future;
use std::time::Duration;

/// Polls `attempt` until it yields a value, sleeping `interval` between
/// tries.
///
/// The first attempt runs immediately, so a condition that already holds
/// never sleeps. `attempt` owns its retry semantics: returning `None` means
/// "not yet" whether the cause was an unmet condition or a transient error.
pub async fn poll_until<T, F, Fut>(interval: Duration, mut attempt: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    loop {
        if let Some(value) = attempt().await {
            return value;
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn immediate_success_never_sleeps() {
        let start = tokio::time::Instant::now();
        let v = poll_until(Duration::from_secs(600), || async { Some(7) }).await;
        assert_eq!(v, 7);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_attempts() {
        let tries = Arc::new(AtomicU32::new(0));
        let t = Arc::clone(&tries);
        let start = tokio::time::Instant::now();

        let v = poll_until(Duration::from_secs(600), move || {
            let t = Arc::clone(&t);
            async move {
                let n = t.fetch_add(1, Ordering::SeqCst);
                if n >= 3 { Some(n) } else { None }
            }
        })
        .await;

        assert_eq!(v, 3);
        assert_eq!(tries.load(Ordering::SeqCst), 4);
        // Three failed attempts, three full backoff sleeps.
        assert_eq!(start.elapsed(), Duration::from_secs(1800));
    }
}
