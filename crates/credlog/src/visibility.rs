//! Waiting for a submitted event to show up in reads
//!
//! A ledger acknowledgement only means the message is durable. The mirror
//! node serves it some seconds later. Instead of sleeping a fixed amount,
//! callers re-run a read with backoff until it sees the change or the timeout
//! runs out, and get back which of the two happened.

use credlog_core::observe;
use credlog_core::{Result, VisibilityConfig};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of a visibility wait
#[derive(Debug, Clone, PartialEq)]
pub enum Visibility<T> {
    /// The probe returned a value
    Visible(T),

    /// The timeout ran out first; expected shortly after a write
    NotYetVisible { attempts: u32, waited: Duration },
}

impl<T> Visibility<T> {
    pub fn is_visible(&self) -> bool {
        matches!(self, Visibility::Visible(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Visibility::Visible(value) => Some(value),
            Visibility::NotYetVisible { .. } => None,
        }
    }
}

/// Re-run `probe` with backoff until it yields `Some` or the timeout elapses
///
/// The first probe runs immediately. Probe errors are returned as-is.
pub async fn await_visible<T, F, Fut>(
    config: &VisibilityConfig,
    mut probe: F,
) -> Result<Visibility<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        if let Some(value) = probe().await? {
            let waited = start.elapsed();
            tracing::debug!(attempts, waited_ms = waited.as_millis() as u64, "Change is visible");
            observe::record_visibility_wait(waited, true);
            return Ok(Visibility::Visible(value));
        }

        let waited = start.elapsed();
        if waited >= config.timeout {
            tracing::debug!(attempts, waited_ms = waited.as_millis() as u64, "Change not yet visible");
            observe::record_visibility_wait(waited, false);
            return Ok(Visibility::NotYetVisible { attempts, waited });
        }

        let delay = config
            .backoff
            .calculate(attempts - 1)
            .min(config.timeout - waited);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credlog_core::{BackoffStrategy, CredlogError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fixed(timeout_ms: u64, delay_ms: u64) -> VisibilityConfig {
        VisibilityConfig::new()
            .with_timeout(Duration::from_millis(timeout_ms))
            .with_backoff(BackoffStrategy::Fixed(Duration::from_millis(delay_ms)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_after_a_few_probes() {
        let calls = &AtomicU32::new(0);
        let outcome = await_visible(&fixed(10_000, 500), move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((n >= 3).then_some(n))
        })
        .await
        .unwrap();

        assert_eq!(outcome, Visibility::Visible(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_yet_visible_after_timeout() {
        let outcome: Visibility<()> = await_visible(&fixed(2_000, 500), || async { Ok(None) })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Visibility::NotYetVisible {
                attempts: 5,
                waited: Duration::from_secs(2),
            }
        );
        assert!(outcome.into_option().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_backoff_is_clamped_to_timeout() {
        let config = VisibilityConfig::new()
            .with_timeout(Duration::from_millis(1_000))
            .with_backoff(BackoffStrategy::Exponential {
                initial: Duration::from_millis(400),
                max: Duration::from_secs(10),
            });

        // probes at 0ms, 400ms, then the 800ms delay is clamped to 600ms
        let outcome: Visibility<()> = await_visible(&config, || async { Ok(None) }).await.unwrap();
        assert_eq!(
            outcome,
            Visibility::NotYetVisible {
                attempts: 3,
                waited: Duration::from_millis(1_000),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_error_ends_the_wait() {
        let result: Result<Visibility<()>> = await_visible(&fixed(1_000, 100), || async {
            Err(CredlogError::Transport("connection reset".into()))
        })
        .await;
        assert!(matches!(result, Err(CredlogError::Transport(_))));
    }
}
